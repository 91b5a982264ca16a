//! Board membership.

use serde::{Deserialize, Serialize};

use super::{decode, decode_all, encode};
use crate::client::{DbError, DbPool, DbResult, Table};
use crate::filter::Filter;
use crate::now_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardMemberRow {
    pub id: String,
    pub board_id: String,
    pub user_id: String,
    pub role: String,
    pub created_at: String,
}

fn member_id(board_id: &str, user_id: &str) -> String {
    format!("{}:{}", board_id, user_id)
}

pub async fn get_member(pool: &DbPool, board_id: &str, user_id: &str) -> DbResult<Option<BoardMemberRow>> {
    let filter = Filter::by_id(&member_id(board_id, user_id));
    pool.select(Table::BoardMembers, &filter).await?.pop().map(decode).transpose()
}

pub async fn list_members(pool: &DbPool, board_id: &str) -> DbResult<Vec<BoardMemberRow>> {
    let rows = pool
        .select(Table::BoardMembers, &Filter::all().eq("board_id", board_id))
        .await?;
    let mut members: Vec<BoardMemberRow> = decode_all(rows)?;
    members.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(members)
}

/// Add a member. Adding an existing member is a conflict.
pub async fn add_member(pool: &DbPool, board_id: &str, user_id: &str, role: &str) -> DbResult<BoardMemberRow> {
    let row = BoardMemberRow {
        id: member_id(board_id, user_id),
        board_id: board_id.to_string(),
        user_id: user_id.to_string(),
        role: role.to_string(),
        created_at: now_timestamp(),
    };
    decode(pool.insert(Table::BoardMembers, encode(&row)?).await?)
}

pub async fn remove_member(pool: &DbPool, board_id: &str, user_id: &str) -> DbResult<BoardMemberRow> {
    let removed = pool
        .delete(Table::BoardMembers, &Filter::by_id(&member_id(board_id, user_id)))
        .await?;
    match removed.into_iter().next() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Member {} on board {}", user_id, board_id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_membership_lifecycle() {
        let pool = crate::in_memory();
        assert!(get_member(&pool, "b1", "u2").await.unwrap().is_none());

        add_member(&pool, "b1", "u2", "editor").await.unwrap();
        assert!(matches!(add_member(&pool, "b1", "u2", "editor").await, Err(DbError::Conflict(_))));
        assert_eq!(get_member(&pool, "b1", "u2").await.unwrap().unwrap().role, "editor");
        assert!(get_member(&pool, "b2", "u2").await.unwrap().is_none());

        remove_member(&pool, "b1", "u2").await.unwrap();
        assert!(list_members(&pool, "b1").await.unwrap().is_empty());
        assert!(matches!(remove_member(&pool, "b1", "u2").await, Err(DbError::NotFound(_))));
    }
}
