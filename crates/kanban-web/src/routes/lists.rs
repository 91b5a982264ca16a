//! List route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use kanban_core::list::{self, List, ListUpdate};
use kanban_realtime::BoardEvent;

use super::success;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateListRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct ReorderListsRequest {
    pub list_ids: Vec<String>,
}

pub async fn create_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(req): Json<CreateListRequest>,
) -> ApiResult<(StatusCode, Json<List>)> {
    let list = list::create_list(&state.db, user.id(), &id, &req.title).await?;

    state.publish(&id, BoardEvent::ListCreated { list: list.clone() });

    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn update_list(
    State(state): State<AppState>,
    Path((id, list_id)): Path<(String, String)>,
    user: CurrentUser,
    Json(req): Json<ListUpdate>,
) -> ApiResult<Json<List>> {
    let list = list::update_list(&state.db, user.id(), &id, &list_id, &req).await?;

    state.publish(&id, BoardEvent::list_updated(list.clone()));

    Ok(Json(list))
}

pub async fn delete_list(
    State(state): State<AppState>,
    Path((id, list_id)): Path<(String, String)>,
    user: CurrentUser,
) -> ApiResult<Json<Value>> {
    let list_id = list::delete_list(&state.db, user.id(), &id, &list_id).await?;

    state.publish(&id, BoardEvent::ListDeleted { list_id });

    Ok(success())
}

pub async fn reorder_lists(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(req): Json<ReorderListsRequest>,
) -> ApiResult<Json<Vec<List>>> {
    let lists = list::reorder_lists(&state.db, user.id(), &id, &req.list_ids).await?;

    state.publish(&id, BoardEvent::ListsReordered { lists: lists.clone() });

    Ok(Json(lists))
}
