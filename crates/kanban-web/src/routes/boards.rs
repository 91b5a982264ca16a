//! Board route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use kanban_core::board::{self, Board, BoardUpdate, BoardView, NewBoard};
use kanban_realtime::BoardEvent;

use super::success;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BoardListQuery {
    #[serde(default)]
    pub workspace_id: Option<String>,
}

pub async fn list_boards(
    State(state): State<AppState>,
    Query(query): Query<BoardListQuery>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Board>>> {
    let boards = board::list_boards(&state.db, user.id(), query.workspace_id.as_deref()).await?;
    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<NewBoard>,
) -> ApiResult<(StatusCode, Json<Board>)> {
    let board = board::create_board(&state.db, user.id(), &req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<BoardView>> {
    let view = board::get_board_view(&state.db, user.id(), &id).await?;
    Ok(Json(view))
}

pub async fn update_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(req): Json<BoardUpdate>,
) -> ApiResult<Json<Board>> {
    let board = board::update_board(&state.db, user.id(), &id, &req).await?;

    state.publish(&id, BoardEvent::BoardUpdated { board: board.clone() });

    Ok(Json(board))
}

/// Delete a board and end every stream open on it.
pub async fn delete_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<Value>> {
    board::delete_board(&state.db, user.id(), &id).await?;

    let closed = state.hub.registry().unregister_board(&id);
    tracing::debug!(board_id = %id, closed, "Closed streams of deleted board");

    Ok(success())
}
