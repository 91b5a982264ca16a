//! Card comments.

use serde::{Deserialize, Serialize};

use super::{decode, decode_all, encode};
use crate::client::{DbPool, DbResult, Table};
use crate::filter::Filter;
use crate::now_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: String,
    pub card_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
}

pub async fn create_comment(pool: &DbPool, card_id: &str, author_id: &str, body: &str) -> DbResult<CommentRow> {
    let row = CommentRow {
        id: uuid::Uuid::new_v4().to_string(),
        card_id: card_id.to_string(),
        author_id: author_id.to_string(),
        body: body.to_string(),
        created_at: now_timestamp(),
    };
    decode(pool.insert(Table::Comments, encode(&row)?).await?)
}

/// Comments for a set of cards, oldest first.
pub async fn comments_for_cards(pool: &DbPool, card_ids: &[String]) -> DbResult<Vec<CommentRow>> {
    if card_ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = Filter::all().is_in("card_id", card_ids.iter().map(String::as_str));
    let mut rows: Vec<CommentRow> = decode_all(pool.select(Table::Comments, &filter).await?)?;
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(rows)
}
