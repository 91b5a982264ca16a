//! Board queries.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{cards, decode, decode_all, encode};
use crate::client::{DbError, DbPool, DbResult, Table};
use crate::filter::Filter;
use crate::now_timestamp;

/// Who can see a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Creator and explicit members only.
    Private,
    /// Visible to the workspace; members are invited by the creator.
    Workspace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRow {
    pub id: String,
    pub title: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub workspace_id: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

pub async fn create_board(
    pool: &DbPool,
    title: &str,
    visibility: Visibility,
    workspace_id: Option<&str>,
    created_by: &str,
) -> DbResult<BoardRow> {
    let now = now_timestamp();
    let row = BoardRow {
        id: uuid::Uuid::new_v4().to_string(),
        title: title.to_string(),
        visibility,
        workspace_id: workspace_id.map(str::to_string),
        created_by: created_by.to_string(),
        created_at: now.clone(),
        updated_at: now,
    };
    decode(pool.insert(Table::Boards, encode(&row)?).await?)
}

pub async fn get_board(pool: &DbPool, board_id: &str) -> DbResult<BoardRow> {
    match pool.select(Table::Boards, &Filter::by_id(board_id)).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Board: {}", board_id))),
    }
}

/// Boards of a workspace that `user_id` created, plus workspace-visible boards
/// of that workspace listing them as a member. Newest first.
pub async fn list_boards_for_user(pool: &DbPool, user_id: &str, workspace_id: &str) -> DbResult<Vec<BoardRow>> {
    let memberships = pool
        .select(Table::BoardMembers, &Filter::all().eq("user_id", user_id))
        .await?;
    let member_of: Vec<String> = memberships
        .iter()
        .filter_map(|m| m.get("board_id").and_then(|v| v.as_str()).map(str::to_string))
        .collect();

    let in_workspace = Filter::all().eq("workspace_id", workspace_id);
    let mut boards: Vec<BoardRow> =
        decode_all(pool.select(Table::Boards, &in_workspace.clone().eq("created_by", user_id)).await?)?;
    if !member_of.is_empty() {
        let filter = in_workspace
            .eq("visibility", encode(&Visibility::Workspace)?)
            .is_in("id", member_of.iter().map(String::as_str));
        let shared: Vec<BoardRow> = decode_all(pool.select(Table::Boards, &filter).await?)?;
        for board in shared {
            if !boards.iter().any(|b| b.id == board.id) {
                boards.push(board);
            }
        }
    }
    boards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(boards)
}

/// Update a board's title and/or visibility.
pub async fn update_board(
    pool: &DbPool,
    board_id: &str,
    title: Option<&str>,
    visibility: Option<Visibility>,
) -> DbResult<BoardRow> {
    let mut patch = json!({ "updated_at": now_timestamp() });
    if let Some(title) = title {
        patch["title"] = json!(title);
    }
    if let Some(visibility) = visibility {
        patch["visibility"] = encode(&visibility)?;
    }
    match pool.update(Table::Boards, &Filter::by_id(board_id), patch).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Board: {}", board_id))),
    }
}

/// Delete a board and every row that belongs to it.
pub async fn delete_board(pool: &DbPool, board_id: &str) -> DbResult<BoardRow> {
    let board = get_board(pool, board_id).await?;
    let owned = Filter::all().eq("board_id", board_id);

    cards::delete_cards_matching(pool, &owned).await?;
    for table in [Table::Lists, Table::Labels, Table::BoardMembers, Table::Activities] {
        pool.delete(table, &owned).await?;
    }
    pool.delete(Table::Boards, &Filter::by_id(board_id)).await?;
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_update() {
        let pool = crate::in_memory();
        let board = create_board(&pool, "Roadmap", Visibility::Workspace, None, "u1").await.unwrap();
        assert_eq!(get_board(&pool, &board.id).await.unwrap(), board);

        let updated = update_board(&pool, &board.id, Some("Roadmap 2026"), Some(Visibility::Private))
            .await
            .unwrap();
        assert_eq!(updated.title, "Roadmap 2026");
        assert_eq!(updated.visibility, Visibility::Private);
        assert_eq!(updated.created_by, "u1");
    }

    #[tokio::test]
    async fn test_delete_board_cascades() {
        let pool = crate::in_memory();
        let board = create_board(&pool, "Roadmap", Visibility::Workspace, None, "u1").await.unwrap();
        let other = create_board(&pool, "Other", Visibility::Workspace, None, "u1").await.unwrap();
        let list = crate::lists::create_list(&pool, &board.id, "Todo").await.unwrap();
        let card = cards::create_card(&pool, &board.id, &list.id, "Ship", "", "u1").await.unwrap();
        crate::comments::create_comment(&pool, &card.id, "u1", "done?").await.unwrap();
        crate::members::add_member(&pool, &board.id, "u2", "editor").await.unwrap();
        let kept = crate::lists::create_list(&pool, &other.id, "Keep").await.unwrap();

        let deleted = delete_board(&pool, &board.id).await.unwrap();
        assert_eq!(deleted.id, board.id);
        assert!(matches!(get_board(&pool, &board.id).await, Err(DbError::NotFound(_))));
        assert!(crate::lists::list_lists(&pool, &board.id).await.unwrap().is_empty());
        assert!(pool.select(Table::Cards, &Filter::by_id(&card.id)).await.unwrap().is_empty());
        assert!(crate::comments::comments_for_cards(&pool, &[card.id.clone()]).await.unwrap().is_empty());
        assert!(crate::members::list_members(&pool, &board.id).await.unwrap().is_empty());
        assert_eq!(crate::lists::list_lists(&pool, &other.id).await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_workspace() {
        let pool = crate::in_memory();
        let own = create_board(&pool, "Mine", Visibility::Private, Some("w1"), "u1").await.unwrap();
        create_board(&pool, "Elsewhere", Visibility::Private, Some("w2"), "u1").await.unwrap();
        let shared = create_board(&pool, "Shared", Visibility::Workspace, Some("w1"), "u2").await.unwrap();
        let private = create_board(&pool, "Hidden", Visibility::Private, Some("w1"), "u2").await.unwrap();
        crate::members::add_member(&pool, &shared.id, "u1", "editor").await.unwrap();
        crate::members::add_member(&pool, &private.id, "u1", "editor").await.unwrap();

        let ids: Vec<String> = list_boards_for_user(&pool, "u1", "w1")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&own.id));
        assert!(ids.contains(&shared.id));
        assert_eq!(list_boards_for_user(&pool, "u1", "w2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_board() {
        let pool = crate::in_memory();
        assert!(matches!(get_board(&pool, "nope").await, Err(DbError::NotFound(_))));
        assert!(matches!(
            update_board(&pool, "nope", Some("x"), None).await,
            Err(DbError::NotFound(_))
        ));
    }
}
