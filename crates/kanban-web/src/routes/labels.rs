//! Label route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use kanban_core::label::{self, Label};
use kanban_realtime::BoardEvent;

use super::success;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateLabelRequest {
    pub name: String,
    #[serde(alias = "color_hex")]
    pub color: String,
}

#[derive(Deserialize)]
pub struct AttachLabelRequest {
    pub label_id: String,
}

#[derive(Deserialize)]
pub struct LabelQuery {
    #[serde(default)]
    pub label_id: String,
}

pub async fn list_labels(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Label>>> {
    let labels = label::list_labels(&state.db, user.id(), &id).await?;
    Ok(Json(labels))
}

/// Create a label. A label with the same name is returned as is.
pub async fn create_label(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(req): Json<CreateLabelRequest>,
) -> ApiResult<(StatusCode, Json<Label>)> {
    let (label, created) = label::create_label(&state.db, user.id(), &id, &req.name, &req.color).await?;

    if !created {
        return Ok((StatusCode::OK, Json(label)));
    }
    state.publish(&id, BoardEvent::LabelCreated { label: label.clone() });

    Ok((StatusCode::CREATED, Json(label)))
}

pub async fn attach_label(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    user: CurrentUser,
    Json(req): Json<AttachLabelRequest>,
) -> ApiResult<Json<Label>> {
    let (label, attached) = label::attach_label(&state.db, user.id(), &id, &card_id, &req.label_id).await?;

    if attached {
        state.publish(
            &id,
            BoardEvent::CardLabelAdded {
                card_id,
                label_id: label.id.clone(),
                label: label.clone(),
            },
        );
    }

    Ok(Json(label))
}

pub async fn detach_label(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    Query(query): Query<LabelQuery>,
    user: CurrentUser,
) -> ApiResult<Json<Value>> {
    label::detach_label(&state.db, user.id(), &id, &card_id, &query.label_id).await?;

    state.publish(
        &id,
        BoardEvent::CardLabelRemoved {
            card_id,
            label_id: query.label_id.trim().to_string(),
        },
    );

    Ok(success())
}
