//! Board member route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use kanban_core::member::{self, Member};
use kanban_realtime::BoardEvent;

use super::success;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct InviteRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct MemberQuery {
    #[serde(default)]
    pub member_id: String,
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Member>>> {
    let members = member::list_members(&state.db, user.id(), &id).await?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(req): Json<InviteRequest>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    let added = member::add_member(&state.db, user.id(), &id, &req.email).await?;

    state.publish(&id, BoardEvent::MemberAdded { member: added.clone() });

    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MemberQuery>,
    user: CurrentUser,
) -> ApiResult<Json<Value>> {
    let member_id = member::remove_member(&state.db, user.id(), &id, &query.member_id).await?;

    state.publish(&id, BoardEvent::MemberRemoved { member_id });

    Ok(success())
}
