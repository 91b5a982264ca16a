//! Comment route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use kanban_core::comment::{self, Comment};
use kanban_realtime::BoardEvent;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub body: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Comment>>> {
    let comments = comment::list_comments(&state.db, user.id(), &id, &card_id).await?;
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    user: CurrentUser,
    Json(req): Json<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = comment::add_comment(&state.db, user.id(), &id, &card_id, &req.body).await?;

    state.publish(
        &id,
        BoardEvent::CommentAdded {
            card_id,
            comment: comment.clone(),
        },
    );

    Ok((StatusCode::CREATED, Json(comment)))
}
