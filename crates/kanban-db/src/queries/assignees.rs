//! Card assignee links.

use serde::{Deserialize, Serialize};

use super::{decode, decode_all, encode};
use crate::client::{DbError, DbPool, DbResult, Table};
use crate::filter::Filter;
use crate::now_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAssigneeRow {
    pub id: String,
    pub card_id: String,
    pub user_id: String,
    pub created_at: String,
}

fn link_id(card_id: &str, user_id: &str) -> String {
    format!("{}:{}", card_id, user_id)
}

pub async fn attach_assignee(pool: &DbPool, card_id: &str, user_id: &str) -> DbResult<CardAssigneeRow> {
    let row = CardAssigneeRow {
        id: link_id(card_id, user_id),
        card_id: card_id.to_string(),
        user_id: user_id.to_string(),
        created_at: now_timestamp(),
    };
    decode(pool.insert(Table::CardAssignees, encode(&row)?).await?)
}

pub async fn detach_assignee(pool: &DbPool, card_id: &str, user_id: &str) -> DbResult<()> {
    let removed = pool
        .delete(Table::CardAssignees, &Filter::by_id(&link_id(card_id, user_id)))
        .await?;
    if removed.is_empty() {
        return Err(DbError::NotFound(format!("Assignee {} on card {}", user_id, card_id)));
    }
    Ok(())
}

pub async fn assignees_for_cards(pool: &DbPool, card_ids: &[String]) -> DbResult<Vec<CardAssigneeRow>> {
    if card_ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = Filter::all().is_in("card_id", card_ids.iter().map(String::as_str));
    let mut rows: Vec<CardAssigneeRow> = decode_all(pool.select(Table::CardAssignees, &filter).await?)?;
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_assign_twice_conflicts() {
        let pool = crate::in_memory();
        attach_assignee(&pool, "c1", "u1").await.unwrap();
        assert!(matches!(attach_assignee(&pool, "c1", "u1").await, Err(DbError::Conflict(_))));
        attach_assignee(&pool, "c1", "u2").await.unwrap();

        let rows = assignees_for_cards(&pool, &["c1".to_string()]).await.unwrap();
        assert_eq!(rows.len(), 2);

        detach_assignee(&pool, "c1", "u1").await.unwrap();
        assert_eq!(assignees_for_cards(&pool, &["c1".to_string()]).await.unwrap().len(), 1);
    }
}
