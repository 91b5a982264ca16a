//! Board operations.

pub mod model;

pub use model::{Board, BoardUpdate, BoardView, NewBoard, Visibility};

use serde_json::json;

use kanban_db::{boards, DbPool};

use crate::access;
use crate::activity;
use crate::error::{required, KanbanError, KanbanResult};
use crate::label;
use crate::list;
use crate::member;
use crate::workspace;

pub async fn create_board(pool: &DbPool, user_id: &str, input: &NewBoard) -> KanbanResult<Board> {
    let title = required("Title", &input.title)?;
    let workspace_id = workspace::workspace_for_new_board(pool, user_id, input.workspace_id.as_deref()).await?;
    let row = boards::create_board(pool, &title, input.visibility, Some(&workspace_id), user_id).await?;

    activity::record(pool, &row.id, user_id, "board.created", json!({ "board_title": row.title })).await;
    tracing::info!(board_id = %row.id, user_id, "Board created");
    Ok(row.into())
}

/// Boards of a workspace the user created or is a member of. Without a
/// workspace id the user's default workspace is listed.
pub async fn list_boards(pool: &DbPool, user_id: &str, workspace_id: Option<&str>) -> KanbanResult<Vec<Board>> {
    let workspace_id = match workspace_id.filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => workspace::default_workspace(pool, user_id).await?.id,
    };
    let rows = boards::list_boards_for_user(pool, user_id, &workspace_id).await?;
    Ok(rows.into_iter().map(Board::from).collect())
}

/// Full board state: lists with cards, labels, members and recent activity.
pub async fn get_board_view(pool: &DbPool, user_id: &str, board_id: &str) -> KanbanResult<BoardView> {
    let access = access::authorize_read(pool, board_id, user_id).await?;

    let lists = list::load_lists(pool, board_id).await?;
    let labels = label::board_labels(pool, board_id).await?;
    let members = member::board_members(pool, board_id, &access.board.created_by).await?;
    let activities = activity::recent(pool, board_id).await?;

    Ok(BoardView {
        board: access.board.into(),
        lists,
        labels,
        members,
        activities,
    })
}

pub async fn update_board(pool: &DbPool, user_id: &str, board_id: &str, update: &BoardUpdate) -> KanbanResult<Board> {
    access::authorize_write(pool, board_id, user_id).await?;
    let title = update.title.as_deref().map(|t| required("Title", t)).transpose()?;

    let row = boards::update_board(pool, board_id, title.as_deref(), update.visibility).await?;
    activity::record(
        pool,
        board_id,
        user_id,
        "board.updated",
        json!({ "board_title": row.title, "visibility": row.visibility }),
    )
    .await;
    Ok(row.into())
}

/// Delete a board with everything on it. Only the creator may.
pub async fn delete_board(pool: &DbPool, user_id: &str, board_id: &str) -> KanbanResult<()> {
    let access = access::authorize_read(pool, board_id, user_id).await?;
    if !access.is_creator() {
        return Err(KanbanError::forbidden("only board owner can delete"));
    }

    boards::delete_board(pool, board_id).await?;
    tracing::info!(board_id, user_id, "Board deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{self, NewCard};

    fn new_board(title: &str, visibility: Visibility) -> NewBoard {
        NewBoard {
            title: title.to_string(),
            visibility,
            workspace_id: None,
        }
    }

    #[tokio::test]
    async fn test_board_view_collects_state() {
        let pool = kanban_db::in_memory();
        member::ensure_profile(&pool, "u1", None, Some("Una")).await.unwrap();
        let board = create_board(&pool, "u1", &new_board("Launch", Visibility::Workspace)).await.unwrap();
        let todo = list::create_list(&pool, "u1", &board.id, "Todo").await.unwrap();
        let input = NewCard {
            list_id: todo.id.clone(),
            title: "Ship".into(),
            description: None,
        };
        card::create_card(&pool, "u1", &board.id, &input).await.unwrap();

        let view = get_board_view(&pool, "u1", &board.id).await.unwrap();
        assert_eq!(view.board.title, "Launch");
        assert_eq!(view.lists.len(), 1);
        assert_eq!(view.lists[0].cards.len(), 1);
        assert_eq!(view.members.len(), 1);
        assert_eq!(view.activities[0].kind, "card.created");
        assert_eq!(view.activities.len(), 3);
    }

    #[tokio::test]
    async fn test_activity_feed_is_capped() {
        let pool = kanban_db::in_memory();
        let board = create_board(&pool, "u1", &new_board("B", Visibility::Private)).await.unwrap();
        for i in 0..25 {
            list::create_list(&pool, "u1", &board.id, &format!("L{}", i)).await.unwrap();
        }
        let view = get_board_view(&pool, "u1", &board.id).await.unwrap();
        assert_eq!(view.activities.len(), activity::RECENT_ACTIVITY_LIMIT);
    }

    #[tokio::test]
    async fn test_update_and_list() {
        let pool = kanban_db::in_memory();
        let board = create_board(&pool, "u1", &new_board("B", Visibility::Private)).await.unwrap();

        let update = BoardUpdate {
            title: Some("Renamed".into()),
            visibility: Some(Visibility::Workspace),
        };
        let updated = update_board(&pool, "u1", &board.id, &update).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.visibility, Visibility::Workspace);

        assert_eq!(list_boards(&pool, "u1", None).await.unwrap().len(), 1);
        assert!(list_boards(&pool, "u2", None).await.unwrap().is_empty());

        assert!(matches!(
            update_board(&pool, "u2", &board.id, &update).await,
            Err(KanbanError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_boards_land_in_workspaces() {
        let pool = kanban_db::in_memory();
        let personal = create_board(&pool, "u1", &new_board("Mine", Visibility::Private)).await.unwrap();
        let default_ws = workspace::default_workspace(&pool, "u1").await.unwrap();
        assert_eq!(personal.workspace_id.as_deref(), Some(default_ws.id.as_str()));

        let team = workspace::create_workspace(&pool, "u1", "Team").await.unwrap();
        let input = NewBoard {
            title: "Shared".into(),
            visibility: Visibility::Workspace,
            workspace_id: Some(team.id.clone()),
        };
        let shared = create_board(&pool, "u1", &input).await.unwrap();
        assert!(matches!(
            create_board(&pool, "u2", &input).await,
            Err(KanbanError::Forbidden(_))
        ));

        let listed = list_boards(&pool, "u1", Some(&team.id)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, shared.id);
        assert_eq!(list_boards(&pool, "u1", None).await.unwrap()[0].id, personal.id);

        kanban_db::members::add_member(&pool, &shared.id, "u2", "editor").await.unwrap();
        assert_eq!(list_boards(&pool, "u2", Some(&team.id)).await.unwrap().len(), 1);
        assert!(list_boards(&pool, "u2", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_creator_deletes() {
        let pool = kanban_db::in_memory();
        let board = create_board(&pool, "u1", &new_board("B", Visibility::Workspace)).await.unwrap();
        kanban_db::members::add_member(&pool, &board.id, "u2", "editor").await.unwrap();

        assert!(matches!(
            delete_board(&pool, "u2", &board.id).await,
            Err(KanbanError::Forbidden(_))
        ));
        delete_board(&pool, "u1", &board.id).await.unwrap();
        assert!(matches!(
            get_board_view(&pool, "u1", &board.id).await,
            Err(KanbanError::BoardNotFound(_))
        ));
    }
}
