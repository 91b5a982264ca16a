//! Store trait, tables and error types.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::Filter;

/// Store error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type for store operations.
pub type DbResult<T> = Result<T, DbError>;

/// Shared handle to whichever backend the process was started with.
pub type DbPool = Arc<dyn RecordStore>;

/// Tables known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Boards,
    Lists,
    Cards,
    Labels,
    CardLabels,
    CardAssignees,
    Comments,
    BoardMembers,
    Profiles,
    Activities,
    Workspaces,
    WorkspaceMembers,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Boards => "boards",
            Table::Lists => "lists",
            Table::Cards => "cards",
            Table::Labels => "labels",
            Table::CardLabels => "card_labels",
            Table::CardAssignees => "card_assignees",
            Table::Comments => "comments",
            Table::BoardMembers => "board_members",
            Table::Profiles => "profiles",
            Table::Activities => "activities",
            Table::Workspaces => "workspaces",
            Table::WorkspaceMembers => "workspace_members",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generic record store.
///
/// Every record is a JSON object carrying a string `id`. Filters are applied
/// to top-level fields only.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Return every record in `table` matching `filter`.
    async fn select(&self, table: Table, filter: &Filter) -> DbResult<Vec<Value>>;

    /// Insert one record, assigning a fresh `id` when the record has none.
    /// Fails with [`DbError::Conflict`] when the id is already taken.
    async fn insert(&self, table: Table, record: Value) -> DbResult<Value>;

    /// Shallow-merge `patch` into every matching record and return the
    /// updated records.
    async fn update(&self, table: Table, filter: &Filter, patch: Value) -> DbResult<Vec<Value>>;

    /// Remove every matching record and return what was removed.
    async fn delete(&self, table: Table, filter: &Filter) -> DbResult<Vec<Value>>;

    /// Merge each record into the row with the same `id`, inserting it when
    /// no such row exists.
    async fn upsert(&self, table: Table, records: Vec<Value>) -> DbResult<Vec<Value>>;
}

/// Normalize a record for insertion: it must be an object, and gets a UUID
/// `id` when none is present.
pub(crate) fn with_id(record: Value) -> DbResult<(String, Value)> {
    let mut map = into_object(record)?;
    let id = match map.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Null) | None => {
            let id = uuid::Uuid::new_v4().to_string();
            map.insert("id".to_string(), Value::String(id.clone()));
            id
        }
        Some(other) => {
            return Err(DbError::InvalidRecord(format!("id must be a string, got {}", other)));
        }
    };
    Ok((id, Value::Object(map)))
}

/// Read the `id` field of a stored record.
pub(crate) fn record_id(record: &Value) -> DbResult<String> {
    record
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DbError::InvalidRecord("record has no string id".to_string()))
}

/// Shallow merge: every top-level field of `patch` overwrites `target`.
/// The `id` field is never changed.
pub(crate) fn merge(target: &mut Value, patch: &Value) -> DbResult<()> {
    let patch = patch
        .as_object()
        .ok_or_else(|| DbError::InvalidRecord("patch must be an object".to_string()))?;
    let target = target
        .as_object_mut()
        .ok_or_else(|| DbError::InvalidRecord("stored record is not an object".to_string()))?;
    for (key, value) in patch {
        if key == "id" {
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
    Ok(())
}

fn into_object(record: Value) -> DbResult<Map<String, Value>> {
    match record {
        Value::Object(map) => Ok(map),
        other => Err(DbError::InvalidRecord(format!("expected an object, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_id_assigns_uuid() {
        let (id, record) = with_id(json!({"title": "Todo"})).unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(record["id"], json!(id));
    }

    #[test]
    fn test_with_id_keeps_existing() {
        let (id, _) = with_id(json!({"id": "c1:l1"})).unwrap();
        assert_eq!(id, "c1:l1");
    }

    #[test]
    fn test_with_id_rejects_non_object() {
        assert!(matches!(with_id(json!([1, 2])), Err(DbError::InvalidRecord(_))));
    }

    #[test]
    fn test_merge_never_touches_id() {
        let mut row = json!({"id": "a", "title": "old", "position": 1000});
        merge(&mut row, &json!({"id": "b", "title": "new"})).unwrap();
        assert_eq!(row, json!({"id": "a", "title": "new", "position": 1000}));
    }
}
