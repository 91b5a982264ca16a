//! List operations.

use serde::{Deserialize, Serialize};
use serde_json::json;

use kanban_db::lists::{self, ListRow};
use kanban_db::{cards, DbPool};

use crate::access;
use crate::activity;
use crate::card::{self, Card};
use crate::error::{required, KanbanError, KanbanResult};

/// A list with its cards in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub board_id: String,
    pub title: String,
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl List {
    fn from_row(row: ListRow, cards: Vec<Card>) -> Self {
        Self {
            id: row.id,
            board_id: row.board_id,
            title: row.title,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
            cards,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

/// Every list of a board with its cards.
pub(crate) async fn load_lists(pool: &DbPool, board_id: &str) -> KanbanResult<Vec<List>> {
    let rows = lists::list_lists(pool, board_id).await?;
    let mut cards = card::hydrate(pool, board_id, cards::list_cards(pool, board_id).await?).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let (mine, rest): (Vec<Card>, Vec<Card>) = cards.drain(..).partition(|c| c.list_id == row.id);
            cards = rest;
            List::from_row(row, mine)
        })
        .collect())
}

async fn load_list(pool: &DbPool, board_id: &str, row: ListRow) -> KanbanResult<List> {
    let rows = cards::list_cards_in_list(pool, board_id, &row.id).await?;
    let cards = card::hydrate(pool, board_id, rows).await?;
    Ok(List::from_row(row, cards))
}

pub async fn create_list(pool: &DbPool, user_id: &str, board_id: &str, title: &str) -> KanbanResult<List> {
    access::authorize_write(pool, board_id, user_id).await?;
    let title = required("Title", title)?;
    let row = lists::create_list(pool, board_id, &title).await?;

    activity::record(
        pool,
        board_id,
        user_id,
        "list.created",
        json!({ "list_id": row.id, "list_title": row.title }),
    )
    .await;
    Ok(List::from_row(row, Vec::new()))
}

pub async fn update_list(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    list_id: &str,
    update: &ListUpdate,
) -> KanbanResult<List> {
    access::authorize_write(pool, board_id, user_id).await?;
    let title = update.title.as_deref().map(|t| required("Title", t)).transpose()?;
    let row = lists::update_list(pool, board_id, list_id, title.as_deref(), update.position).await?;

    activity::record(
        pool,
        board_id,
        user_id,
        "list.updated",
        json!({ "list_id": row.id, "list_title": row.title }),
    )
    .await;
    load_list(pool, board_id, row).await
}

/// Delete a list and its cards. Returns the deleted list's id.
pub async fn delete_list(pool: &DbPool, user_id: &str, board_id: &str, list_id: &str) -> KanbanResult<String> {
    access::authorize_write(pool, board_id, user_id).await?;
    let row = lists::delete_list(pool, board_id, list_id).await?;

    activity::record(
        pool,
        board_id,
        user_id,
        "list.deleted",
        json!({ "list_id": row.id, "list_title": row.title }),
    )
    .await;
    Ok(row.id)
}

/// Reorder lists following `ordered_ids` and return the full collection.
pub async fn reorder_lists(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    ordered_ids: &[String],
) -> KanbanResult<Vec<List>> {
    access::authorize_write(pool, board_id, user_id).await?;
    if ordered_ids.is_empty() {
        return Err(KanbanError::validation("Lists are required"));
    }
    lists::reorder_lists(pool, board_id, ordered_ids).await?;

    activity::record(
        pool,
        board_id,
        user_id,
        "lists.reordered",
        json!({ "list_ids": ordered_ids }),
    )
    .await;
    load_lists(pool, board_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_db::boards::{self, Visibility};

    async fn setup() -> (DbPool, String) {
        let pool = kanban_db::in_memory();
        let board = boards::create_board(&pool, "B", Visibility::Workspace, None, "u1").await.unwrap();
        (pool, board.id)
    }

    #[tokio::test]
    async fn test_reorder_returns_full_collection() {
        let (pool, board_id) = setup().await;
        let a = create_list(&pool, "u1", &board_id, "A").await.unwrap();
        let b = create_list(&pool, "u1", &board_id, "B").await.unwrap();

        let lists = reorder_lists(&pool, "u1", &board_id, &[b.id.clone(), a.id.clone()]).await.unwrap();
        let ids: Vec<&str> = lists.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec![b.id.as_str(), a.id.as_str()]);
        assert_eq!(lists[0].position, 1000);
        assert_eq!(lists[1].position, 2000);
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let (pool, board_id) = setup().await;
        assert!(matches!(
            create_list(&pool, "u1", &board_id, "  ").await,
            Err(KanbanError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_viewer_cannot_create() {
        let (pool, board_id) = setup().await;
        assert!(matches!(
            create_list(&pool, "someone", &board_id, "A").await,
            Err(KanbanError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_list_returns_id() {
        let (pool, board_id) = setup().await;
        let a = create_list(&pool, "u1", &board_id, "A").await.unwrap();
        assert_eq!(delete_list(&pool, "u1", &board_id, &a.id).await.unwrap(), a.id);
        assert!(matches!(
            delete_list(&pool, "u1", &board_id, &a.id).await,
            Err(KanbanError::NotFound(_))
        ));
    }
}
