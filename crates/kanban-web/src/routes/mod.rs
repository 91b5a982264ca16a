//! Route handlers.

pub mod assignees;
pub mod boards;
pub mod cards;
pub mod comments;
pub mod events;
pub mod labels;
pub mod lists;
pub mod members;
pub mod workspaces;

use axum::Json;
use serde_json::{json, Value};

/// Body returned by deletes and other mutations without a payload.
pub(crate) fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}
