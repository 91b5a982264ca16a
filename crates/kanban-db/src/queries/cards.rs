//! Card queries.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{decode, decode_all, encode, POSITION_STEP};
use crate::client::{DbError, DbPool, DbResult, Table};
use crate::filter::Filter;
use crate::now_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRow {
    pub id: String,
    pub board_id: String,
    pub list_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub position: i64,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Field changes for [`update_card`]. `None` leaves a field untouched;
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<String>>,
    pub position: Option<i64>,
    pub archived: Option<bool>,
}

/// Target slot for one card in a bulk reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPlacement {
    pub id: String,
    pub list_id: String,
    #[serde(default)]
    pub position: Option<i64>,
}

/// Unarchived cards of a board ordered by position.
pub async fn list_cards(pool: &DbPool, board_id: &str) -> DbResult<Vec<CardRow>> {
    let rows = pool
        .select(Table::Cards, &Filter::all().eq("board_id", board_id).eq("archived", false))
        .await?;
    let mut cards: Vec<CardRow> = decode_all(rows)?;
    cards.sort_by_key(|c| c.position);
    Ok(cards)
}

/// Cards of one list ordered by position.
pub async fn list_cards_in_list(pool: &DbPool, board_id: &str, list_id: &str) -> DbResult<Vec<CardRow>> {
    Ok(list_cards(pool, board_id)
        .await?
        .into_iter()
        .filter(|c| c.list_id == list_id)
        .collect())
}

pub async fn get_card(pool: &DbPool, board_id: &str, card_id: &str) -> DbResult<CardRow> {
    let filter = Filter::by_id(card_id).eq("board_id", board_id);
    match pool.select(Table::Cards, &filter).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Card: {}", card_id))),
    }
}

/// Append a card at the bottom of a list.
pub async fn create_card(
    pool: &DbPool,
    board_id: &str,
    list_id: &str,
    title: &str,
    description: &str,
    created_by: &str,
) -> DbResult<CardRow> {
    let last = list_cards_in_list(pool, board_id, list_id)
        .await?
        .last()
        .map(|c| c.position);
    let now = now_timestamp();
    let row = CardRow {
        id: uuid::Uuid::new_v4().to_string(),
        board_id: board_id.to_string(),
        list_id: list_id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        position: last.map_or(POSITION_STEP, |p| p + POSITION_STEP),
        due_date: None,
        archived: false,
        created_by: created_by.to_string(),
        created_at: now.clone(),
        updated_at: now,
    };
    decode(pool.insert(Table::Cards, encode(&row)?).await?)
}

pub async fn update_card(
    pool: &DbPool,
    board_id: &str,
    card_id: &str,
    patch: &CardPatch,
) -> DbResult<CardRow> {
    let mut changes = json!({ "updated_at": now_timestamp() });
    if let Some(title) = &patch.title {
        changes["title"] = json!(title);
    }
    if let Some(description) = &patch.description {
        changes["description"] = json!(description);
    }
    if let Some(due_date) = &patch.due_date {
        changes["due_date"] = json!(due_date);
    }
    if let Some(position) = patch.position {
        changes["position"] = json!(position);
    }
    if let Some(archived) = patch.archived {
        changes["archived"] = json!(archived);
    }
    let filter = Filter::by_id(card_id).eq("board_id", board_id);
    match pool.update(Table::Cards, &filter, changes).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Card: {}", card_id))),
    }
}

/// Delete a card and everything hanging off it.
pub async fn delete_card(pool: &DbPool, board_id: &str, card_id: &str) -> DbResult<CardRow> {
    let card = get_card(pool, board_id, card_id).await?;
    delete_card_links(pool, &[card.id.as_str()]).await?;
    pool.delete(Table::Cards, &Filter::by_id(card_id)).await?;
    Ok(card)
}

pub(crate) async fn delete_cards_in_list(pool: &DbPool, board_id: &str, list_id: &str) -> DbResult<()> {
    delete_cards_matching(pool, &Filter::all().eq("board_id", board_id).eq("list_id", list_id)).await
}

/// Delete every card matching `filter`, archived ones included, with their
/// labels, assignees and comments.
pub(crate) async fn delete_cards_matching(pool: &DbPool, filter: &Filter) -> DbResult<()> {
    let removed = pool.delete(Table::Cards, filter).await?;
    let ids: Vec<&str> = removed
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_str()))
        .collect();
    delete_card_links(pool, &ids).await
}

async fn delete_card_links(pool: &DbPool, card_ids: &[&str]) -> DbResult<()> {
    if card_ids.is_empty() {
        return Ok(());
    }
    let filter = Filter::all().is_in("card_id", card_ids.iter().copied());
    for table in [Table::CardLabels, Table::CardAssignees, Table::Comments] {
        pool.delete(table, &filter).await?;
    }
    Ok(())
}

/// Result of [`move_card`].
#[derive(Debug, Clone)]
pub struct MovedCard {
    pub from_list_id: String,
    pub card: CardRow,
    /// Destination list after renumbering, in order.
    pub destination: Vec<CardRow>,
}

/// Move a card into `to_list_id` at `index` (clamped to the list length) and
/// renumber the destination list.
pub async fn move_card(
    pool: &DbPool,
    board_id: &str,
    card_id: &str,
    to_list_id: &str,
    index: usize,
) -> DbResult<MovedCard> {
    let card = get_card(pool, board_id, card_id).await?;
    let from_list_id = card.list_id.clone();

    let mut destination: Vec<CardRow> = list_cards_in_list(pool, board_id, to_list_id)
        .await?
        .into_iter()
        .filter(|c| c.id != card.id)
        .collect();
    let index = index.min(destination.len());
    destination.insert(index, card);

    let now = now_timestamp();
    let patches = destination
        .iter()
        .enumerate()
        .map(|(i, c)| {
            json!({
                "id": c.id,
                "list_id": to_list_id,
                "position": (i as i64 + 1) * POSITION_STEP,
                "updated_at": now,
            })
        })
        .collect();
    let destination: Vec<CardRow> = decode_all(pool.upsert(Table::Cards, patches).await?)?;
    let card = destination
        .get(index)
        .cloned()
        .ok_or_else(|| DbError::NotFound(format!("Card: {}", card_id)))?;

    Ok(MovedCard {
        from_list_id,
        card,
        destination,
    })
}

/// Apply a batch of placements. A placement without a position gets
/// `(index + 1) * POSITION_STEP` from its place in the batch.
pub async fn reorder_cards(
    pool: &DbPool,
    board_id: &str,
    placements: &[CardPlacement],
) -> DbResult<Vec<CardRow>> {
    let existing = list_cards(pool, board_id).await?;
    if let Some(unknown) = placements
        .iter()
        .find(|p| !existing.iter().any(|c| c.id == p.id))
    {
        return Err(DbError::NotFound(format!("Card: {}", unknown.id)));
    }

    let now = now_timestamp();
    let patches = placements
        .iter()
        .enumerate()
        .map(|(index, p)| {
            json!({
                "id": p.id,
                "list_id": p.list_id,
                "position": p.position.unwrap_or((index as i64 + 1) * POSITION_STEP),
                "updated_at": now,
            })
        })
        .collect();
    decode_all(pool.upsert(Table::Cards, patches).await?)
}
