//! Card operations, including assignees.

pub mod model;

pub use model::{Card, CardMove, CardUpdate, MoveCard, NewCard};

use std::collections::HashMap;

use serde_json::json;

use kanban_db::assignees;
use kanban_db::cards::{self, CardPatch, CardPlacement, CardRow};
use kanban_db::{labels, lists, DbError, DbPool};

use crate::access;
use crate::activity;
use crate::error::{required, KanbanError, KanbanResult};
use crate::label;
use crate::list::{self, List};
use crate::member::{self, Profile};

/// Attach labels and assignee profiles to card rows, keeping their order.
pub(crate) async fn hydrate(pool: &DbPool, board_id: &str, rows: Vec<CardRow>) -> KanbanResult<Vec<Card>> {
    let ids: Vec<String> = rows.iter().map(|c| c.id.clone()).collect();

    let board_labels = label::labels_by_id(pool, board_id).await?;
    let mut labels_of: HashMap<String, Vec<label::Label>> = HashMap::new();
    for link in labels::links_for_cards(pool, &ids).await? {
        if let Some(l) = board_labels.get(&link.label_id) {
            labels_of.entry(link.card_id).or_default().push(l.clone());
        }
    }

    let links = assignees::assignees_for_cards(pool, &ids).await?;
    let user_ids: Vec<String> = links.iter().map(|a| a.user_id.clone()).collect();
    let profiles = member::profiles_by_id(pool, &user_ids).await?;
    let mut assignees_of: HashMap<String, Vec<Profile>> = HashMap::new();
    for link in links {
        if let Some(p) = profiles.get(&link.user_id) {
            assignees_of.entry(link.card_id).or_default().push(p.clone());
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let labels = labels_of.remove(&row.id).unwrap_or_default();
            let assignees = assignees_of.remove(&row.id).unwrap_or_default();
            Card::from_row(row, labels, assignees)
        })
        .collect())
}

async fn hydrate_one(pool: &DbPool, board_id: &str, row: CardRow) -> KanbanResult<Card> {
    let id = row.id.clone();
    hydrate(pool, board_id, vec![row])
        .await?
        .pop()
        .ok_or_else(|| KanbanError::NotFound(format!("Card: {}", id)))
}

/// Hydrate a card that was just written. A failed read falls back to the
/// stored row without labels or assignees so the caller still reports the
/// committed change.
async fn hydrate_stored(pool: &DbPool, board_id: &str, row: CardRow) -> Card {
    match hydrate(pool, board_id, vec![row.clone()]).await {
        Ok(mut cards) if !cards.is_empty() => cards.remove(0),
        Ok(_) => Card::from_row(row, Vec::new(), Vec::new()),
        Err(e) => {
            tracing::warn!(board_id, card_id = %row.id, error = %e, "Failed to hydrate stored card");
            Card::from_row(row, Vec::new(), Vec::new())
        }
    }
}

pub async fn get_card(pool: &DbPool, user_id: &str, board_id: &str, card_id: &str) -> KanbanResult<Card> {
    access::authorize_read(pool, board_id, user_id).await?;
    let row = cards::get_card(pool, board_id, card_id).await?;
    hydrate_one(pool, board_id, row).await
}

/// Append a card to the bottom of a list.
pub async fn create_card(pool: &DbPool, user_id: &str, board_id: &str, input: &NewCard) -> KanbanResult<Card> {
    access::authorize_write(pool, board_id, user_id).await?;
    let title = required("Title", &input.title)?;
    let list = lists::get_list(pool, board_id, &input.list_id).await?;

    let description = input.description.as_deref().unwrap_or_default();
    let row = cards::create_card(pool, board_id, &list.id, &title, description, user_id).await?;

    activity::record(
        pool,
        board_id,
        user_id,
        "card.created",
        json!({ "card_id": row.id, "card_title": row.title, "list_id": list.id, "list_title": list.title }),
    )
    .await;

    Ok(hydrate_stored(pool, board_id, row).await)
}

pub async fn update_card(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    card_id: &str,
    update: &CardUpdate,
) -> KanbanResult<Card> {
    access::authorize_write(pool, board_id, user_id).await?;
    let title = update.title.as_deref().map(|t| required("Title", t)).transpose()?;

    let patch = CardPatch {
        title,
        description: update.description.clone(),
        due_date: update.due_date.clone(),
        position: update.position,
        archived: update.archived,
    };
    let row = cards::update_card(pool, board_id, card_id, &patch).await?;

    activity::record(
        pool,
        board_id,
        user_id,
        "card.updated",
        json!({ "card_id": row.id, "card_title": row.title }),
    )
    .await;

    Ok(hydrate_stored(pool, board_id, row).await)
}

/// Delete a card. Returns the card as it was before deletion.
pub async fn delete_card(pool: &DbPool, user_id: &str, board_id: &str, card_id: &str) -> KanbanResult<Card> {
    access::authorize_write(pool, board_id, user_id).await?;
    let row = cards::get_card(pool, board_id, card_id).await?;
    let card = hydrate_one(pool, board_id, row).await?;

    cards::delete_card(pool, board_id, card_id).await?;

    activity::record(
        pool,
        board_id,
        user_id,
        "card.deleted",
        json!({ "card_id": card.id, "card_title": card.title, "list_id": card.list_id }),
    )
    .await;
    Ok(card)
}

/// Move a card to another list (or another slot in its own list).
pub async fn move_card(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    card_id: &str,
    request: &MoveCard,
) -> KanbanResult<CardMove> {
    access::authorize_write(pool, board_id, user_id).await?;
    let to_list = lists::get_list(pool, board_id, &request.to_list_id).await?;

    let moved = cards::move_card(pool, board_id, card_id, &to_list.id, request.position).await?;
    let position = moved
        .destination
        .iter()
        .position(|c| c.id == moved.card.id)
        .unwrap_or(request.position);

    activity::record(
        pool,
        board_id,
        user_id,
        "card.moved",
        json!({
            "card_id": moved.card.id,
            "card_title": moved.card.title,
            "from_list_id": moved.from_list_id,
            "to_list_id": to_list.id,
            "to_list_title": to_list.title,
        }),
    )
    .await;

    let card = hydrate_stored(pool, board_id, moved.card).await;
    Ok(CardMove {
        card,
        from_list_id: moved.from_list_id,
        to_list_id: to_list.id,
        position,
    })
}

/// Apply a batch of card placements and return the resulting lists.
pub async fn reorder_cards(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    placements: &[CardPlacement],
) -> KanbanResult<Vec<List>> {
    access::authorize_write(pool, board_id, user_id).await?;
    if placements.is_empty() {
        return Err(KanbanError::validation("Cards are required"));
    }

    let board_lists = lists::list_lists(pool, board_id).await?;
    if let Some(p) = placements
        .iter()
        .find(|p| !board_lists.iter().any(|l| l.id == p.list_id))
    {
        return Err(KanbanError::NotFound(format!("List: {}", p.list_id)));
    }

    cards::reorder_cards(pool, board_id, placements).await?;
    activity::record(
        pool,
        board_id,
        user_id,
        "cards.reordered",
        json!({ "count": placements.len() }),
    )
    .await;

    list::load_lists(pool, board_id).await
}

/// Assign a user to a card. Assigning an existing assignee returns their
/// profile with `false`.
pub async fn assign(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    card_id: &str,
    assignee_id: &str,
) -> KanbanResult<(Profile, bool)> {
    let assignee_id = required("User ID", assignee_id)?;
    access::authorize_write(pool, board_id, user_id).await?;
    let card = cards::get_card(pool, board_id, card_id).await?;
    let profile = member::get_profile(pool, &assignee_id).await?;

    match assignees::attach_assignee(pool, card_id, &assignee_id).await {
        Ok(_) => {}
        Err(DbError::Conflict(_)) => return Ok((profile, false)),
        Err(e) => return Err(e.into()),
    }

    activity::record(
        pool,
        board_id,
        user_id,
        "card.assigned",
        json!({
            "card_id": card.id,
            "card_title": card.title,
            "assignee_id": profile.id,
            "assignee_name": profile.display_name,
        }),
    )
    .await;
    Ok((profile, true))
}

pub async fn unassign(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    card_id: &str,
    assignee_id: &str,
) -> KanbanResult<()> {
    let assignee_id = required("User ID", assignee_id)?;
    access::authorize_write(pool, board_id, user_id).await?;
    let card = cards::get_card(pool, board_id, card_id).await?;

    assignees::detach_assignee(pool, card_id, &assignee_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => KanbanError::NotFound("Assignee not found on card".to_string()),
            other => other.into(),
        })?;

    activity::record(
        pool,
        board_id,
        user_id,
        "card.unassigned",
        json!({ "card_id": card.id, "card_title": card.title, "assignee_id": assignee_id }),
    )
    .await;
    Ok(())
}
