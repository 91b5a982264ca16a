//! Server-sent event stream and admin publish.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kanban_core::access;
use kanban_realtime::BoardEvent;

use super::success;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Header carrying the admin publish token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Open an event stream on a board the caller can read.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> ApiResult<Response> {
    let access = access::authorize_read(&state.db, &id, user.id()).await?;
    let subscription = state.hub.subscribe(&access.board.id, user.id()).await;

    Ok((
        [(CONTENT_TYPE, "text/event-stream"), (CACHE_CONTROL, "no-cache")],
        Body::from_stream(subscription),
    )
        .into_response())
}

/// Compare a presented token with the configured one in constant time.
fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Push an arbitrary event to a board's subscribers.
pub async fn admin_publish(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ApiError::forbidden("Admin publish is disabled"));
    };
    match headers.get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        None => return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized")),
        Some(token) if !token_matches(token, expected) => {
            warn!(board_id = %id, "Rejected admin publish with wrong token");
            return Err(ApiError::forbidden("Forbidden"));
        }
        Some(_) => {}
    }

    let board_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::bad_request("Invalid board ID"))?
        .to_string();

    let event: BoardEvent = serde_json::from_slice(&body).map_err(|e| {
        debug!(board_id = %board_id, error = %e, "Malformed admin event");
        ApiError::bad_request("Invalid event")
    })?;
    if matches!(event, BoardEvent::Connected { .. }) {
        return Err(ApiError::bad_request("Invalid event"));
    }

    info!(board_id = %board_id, event = event.kind(), "Admin publish");
    state.publish(&board_id, event);

    Ok(success())
}
