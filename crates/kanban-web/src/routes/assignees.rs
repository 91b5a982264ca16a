//! Card assignee route handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use kanban_core::card;
use kanban_core::member::Profile;
use kanban_realtime::BoardEvent;

use super::success;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AssigneeRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct AssigneeQuery {
    #[serde(default)]
    pub user_id: String,
}

pub async fn add_assignee(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    user: CurrentUser,
    Json(req): Json<AssigneeRequest>,
) -> ApiResult<Json<Profile>> {
    let (assignee, added) = card::assign(&state.db, user.id(), &id, &card_id, &req.user_id).await?;

    if added {
        state.publish(
            &id,
            BoardEvent::CardAssigneeAdded {
                card_id,
                user_id: assignee.id.clone(),
                assignee: assignee.clone(),
            },
        );
    }

    Ok(Json(assignee))
}

pub async fn remove_assignee(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    Query(query): Query<AssigneeQuery>,
    user: CurrentUser,
) -> ApiResult<Json<Value>> {
    card::unassign(&state.db, user.id(), &id, &card_id, &query.user_id).await?;

    state.publish(
        &id,
        BoardEvent::CardAssigneeRemoved {
            card_id,
            user_id: query.user_id.trim().to_string(),
        },
    );

    Ok(success())
}
