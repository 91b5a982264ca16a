//! Board labels and card-label links.

use serde::{Deserialize, Serialize};

use super::{decode, decode_all, encode};
use crate::client::{DbError, DbPool, DbResult, Table};
use crate::filter::Filter;
use crate::now_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRow {
    pub id: String,
    pub board_id: String,
    pub name: String,
    pub color_hex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardLabelRow {
    pub id: String,
    pub card_id: String,
    pub label_id: String,
    pub created_at: String,
}

pub async fn list_labels(pool: &DbPool, board_id: &str) -> DbResult<Vec<LabelRow>> {
    let rows = pool.select(Table::Labels, &Filter::all().eq("board_id", board_id)).await?;
    let mut labels: Vec<LabelRow> = decode_all(rows)?;
    labels.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(labels)
}

pub async fn get_label(pool: &DbPool, board_id: &str, label_id: &str) -> DbResult<LabelRow> {
    let filter = Filter::by_id(label_id).eq("board_id", board_id);
    match pool.select(Table::Labels, &filter).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Label: {}", label_id))),
    }
}

pub async fn find_label_by_name(pool: &DbPool, board_id: &str, name: &str) -> DbResult<Option<LabelRow>> {
    let filter = Filter::all().eq("board_id", board_id).eq("name", name);
    pool.select(Table::Labels, &filter).await?.pop().map(decode).transpose()
}

pub async fn create_label(pool: &DbPool, board_id: &str, name: &str, color_hex: &str) -> DbResult<LabelRow> {
    let row = LabelRow {
        id: uuid::Uuid::new_v4().to_string(),
        board_id: board_id.to_string(),
        name: name.to_string(),
        color_hex: color_hex.to_string(),
    };
    decode(pool.insert(Table::Labels, encode(&row)?).await?)
}

fn link_id(card_id: &str, label_id: &str) -> String {
    format!("{}:{}", card_id, label_id)
}

/// Attach a label to a card. Attaching twice is a conflict.
pub async fn attach_label(pool: &DbPool, card_id: &str, label_id: &str) -> DbResult<CardLabelRow> {
    let row = CardLabelRow {
        id: link_id(card_id, label_id),
        card_id: card_id.to_string(),
        label_id: label_id.to_string(),
        created_at: now_timestamp(),
    };
    decode(pool.insert(Table::CardLabels, encode(&row)?).await?)
}

/// Detach a label from a card.
pub async fn detach_label(pool: &DbPool, card_id: &str, label_id: &str) -> DbResult<()> {
    let removed = pool
        .delete(Table::CardLabels, &Filter::by_id(&link_id(card_id, label_id)))
        .await?;
    if removed.is_empty() {
        return Err(DbError::NotFound(format!("Label {} on card {}", label_id, card_id)));
    }
    Ok(())
}

/// Card-label links for a set of cards.
pub async fn links_for_cards(pool: &DbPool, card_ids: &[String]) -> DbResult<Vec<CardLabelRow>> {
    if card_ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = Filter::all().is_in("card_id", card_ids.iter().map(String::as_str));
    decode_all(pool.select(Table::CardLabels, &filter).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attach_detach() {
        let pool = crate::in_memory();
        let label = create_label(&pool, "b1", "bug", "#ff0000").await.unwrap();

        attach_label(&pool, "c1", &label.id).await.unwrap();
        assert!(matches!(attach_label(&pool, "c1", &label.id).await, Err(DbError::Conflict(_))));

        let links = links_for_cards(&pool, &["c1".to_string()]).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label_id, label.id);

        detach_label(&pool, "c1", &label.id).await.unwrap();
        assert!(matches!(detach_label(&pool, "c1", &label.id).await, Err(DbError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_name_is_board_scoped() {
        let pool = crate::in_memory();
        create_label(&pool, "b1", "bug", "#ff0000").await.unwrap();
        assert!(find_label_by_name(&pool, "b1", "bug").await.unwrap().is_some());
        assert!(find_label_by_name(&pool, "b2", "bug").await.unwrap().is_none());
    }
}
