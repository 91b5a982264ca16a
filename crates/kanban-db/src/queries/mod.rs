//! Typed queries over the record store.

pub mod activities;
pub mod assignees;
pub mod boards;
pub mod cards;
pub mod comments;
pub mod labels;
pub mod lists;
pub mod members;
pub mod profiles;
pub mod workspaces;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::DbResult;

/// Gap left between neighbouring list and card positions.
pub const POSITION_STEP: i64 = 1000;

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> DbResult<T> {
    Ok(serde_json::from_value(value)?)
}

pub(crate) fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> DbResult<Vec<T>> {
    values.into_iter().map(decode).collect()
}

pub(crate) fn encode<T: Serialize>(row: &T) -> DbResult<Value> {
    Ok(serde_json::to_value(row)?)
}
