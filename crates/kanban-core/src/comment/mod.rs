//! Card comments.

use serde::{Deserialize, Serialize};
use serde_json::json;

use kanban_db::comments::{self, CommentRow};
use kanban_db::{cards, DbPool};

use crate::access;
use crate::activity;
use crate::error::{required, KanbanResult};
use crate::member::{self, Profile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub card_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
    #[serde(default)]
    pub author: Option<Profile>,
}

impl Comment {
    fn from_row(row: CommentRow, author: Option<Profile>) -> Self {
        Self {
            id: row.id,
            card_id: row.card_id,
            author_id: row.author_id,
            body: row.body,
            created_at: row.created_at,
            author,
        }
    }
}

/// Comments on a card, oldest first.
pub async fn list_comments(pool: &DbPool, user_id: &str, board_id: &str, card_id: &str) -> KanbanResult<Vec<Comment>> {
    access::authorize_read(pool, board_id, user_id).await?;
    cards::get_card(pool, board_id, card_id).await?;

    let rows = comments::comments_for_cards(pool, &[card_id.to_string()]).await?;
    let authors: Vec<String> = rows.iter().map(|c| c.author_id.clone()).collect();
    let profiles = member::profiles_by_id(pool, &authors).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let author = profiles.get(&row.author_id).cloned();
            Comment::from_row(row, author)
        })
        .collect())
}

pub async fn add_comment(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    card_id: &str,
    body: &str,
) -> KanbanResult<Comment> {
    access::authorize_write(pool, board_id, user_id).await?;
    let card = cards::get_card(pool, board_id, card_id).await?;
    let body = required("Comment body", body)?;

    let row = comments::create_comment(pool, card_id, user_id, &body).await?;
    activity::record(
        pool,
        board_id,
        user_id,
        "comment.added",
        json!({ "card_id": card.id, "card_title": card.title, "comment_id": row.id }),
    )
    .await;

    let author = match member::profiles_by_id(pool, &[user_id.to_string()]).await {
        Ok(mut profiles) => profiles.remove(user_id),
        Err(e) => {
            tracing::warn!(board_id, comment_id = %row.id, error = %e, "Failed to load comment author");
            None
        }
    };
    Ok(Comment::from_row(row, author))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KanbanError;
    use kanban_db::boards::{self, Visibility};
    use kanban_db::lists;

    #[tokio::test]
    async fn test_comment_carries_author() {
        let pool = kanban_db::in_memory();
        member::ensure_profile(&pool, "u1", None, Some("Una")).await.unwrap();
        let board = boards::create_board(&pool, "B", Visibility::Workspace, None, "u1").await.unwrap();
        let list = lists::create_list(&pool, &board.id, "L").await.unwrap();
        let card = cards::create_card(&pool, &board.id, &list.id, "C", "", "u1").await.unwrap();

        let comment = add_comment(&pool, "u1", &board.id, &card.id, "Looks good").await.unwrap();
        assert_eq!(comment.author.as_ref().map(|a| a.display_name.as_str()), Some("Una"));

        assert!(matches!(
            add_comment(&pool, "u1", &board.id, &card.id, "").await,
            Err(KanbanError::ValidationError(_))
        ));

        let all = list_comments(&pool, "u1", &board.id, &card.id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].body, "Looks good");
    }
}
