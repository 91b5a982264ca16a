//! Workspace route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use kanban_core::workspace::{
    self, NewWorkspace, RoleUpdate, Workspace, WorkspaceInvite, WorkspaceMember, WorkspaceView,
};

use super::success;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_workspaces(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<Vec<WorkspaceView>>> {
    let workspaces = workspace::list_workspaces(&state.db, user.id()).await?;
    Ok(Json(workspaces))
}

pub async fn create_workspace(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<NewWorkspace>,
) -> ApiResult<(StatusCode, Json<Workspace>)> {
    let created = workspace::create_workspace(&state.db, user.id(), &req.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_workspace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<WorkspaceView>> {
    let view = workspace::get_workspace(&state.db, user.id(), &id).await?;
    Ok(Json(view))
}

pub async fn rename_workspace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(req): Json<NewWorkspace>,
) -> ApiResult<Json<Workspace>> {
    let renamed = workspace::rename_workspace(&state.db, user.id(), &id, &req.name).await?;
    Ok(Json(renamed))
}

/// Delete a workspace and end the streams of every board it held.
pub async fn delete_workspace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<Value>> {
    let board_ids = workspace::delete_workspace(&state.db, user.id(), &id).await?;

    let registry = state.hub.registry();
    let closed: usize = board_ids.iter().map(|b| registry.unregister_board(b)).sum();
    tracing::debug!(workspace_id = %id, closed, "Closed streams of deleted workspace");

    Ok(success())
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<WorkspaceMember>>> {
    let members = workspace::list_members(&state.db, user.id(), &id).await?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(req): Json<WorkspaceInvite>,
) -> ApiResult<(StatusCode, Json<WorkspaceMember>)> {
    let added = workspace::add_member(&state.db, user.id(), &id, &req).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path((id, member_id)): Path<(String, String)>,
    user: CurrentUser,
    Json(req): Json<RoleUpdate>,
) -> ApiResult<Json<WorkspaceMember>> {
    let updated = workspace::update_member_role(&state.db, user.id(), &id, &member_id, &req.role).await?;
    Ok(Json(updated))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((id, member_id)): Path<(String, String)>,
    user: CurrentUser,
) -> ApiResult<Json<Value>> {
    workspace::remove_member(&state.db, user.id(), &id, &member_id).await?;
    Ok(success())
}
