//! In-process record store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::client::{merge, record_id, with_id, DbError, DbResult, RecordStore, Table};
use crate::filter::Filter;

/// Record store kept in process memory. Rows keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: Table, filter: &Filter) -> DbResult<Vec<Value>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, record: Value) -> DbResult<Value> {
        let (id, record) = with_id(record)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        if rows.iter().any(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str())) {
            return Err(DbError::Conflict(format!("{}: {}", table, id)));
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Value) -> DbResult<Vec<Value>> {
        let mut tables = self.tables.write().await;
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(&table) {
            for row in rows.iter_mut().filter(|r| filter.matches(r)) {
                merge(row, &patch)?;
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> DbResult<Vec<Value>> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(Vec::new());
        };
        let (removed, kept): (Vec<Value>, Vec<Value>) =
            rows.drain(..).partition(|r| filter.matches(r));
        *rows = kept;
        Ok(removed)
    }

    async fn upsert(&self, table: Table, records: Vec<Value>) -> DbResult<Vec<Value>> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let mut result = Vec::with_capacity(records.len());
        for record in records {
            let (id, record) = with_id(record)?;
            let existing = rows
                .iter_mut()
                .find(|r| record_id(r).is_ok_and(|existing| existing == id));
            match existing {
                Some(row) => {
                    merge(row, &record)?;
                    result.push(row.clone());
                }
                None => {
                    rows.push(record.clone());
                    result.push(record);
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_select() {
        let store = MemoryStore::new();
        store.insert(Table::Lists, json!({"id": "l1", "board_id": "b1"})).await.unwrap();
        store.insert(Table::Lists, json!({"id": "l2", "board_id": "b2"})).await.unwrap();

        let rows = store.select(Table::Lists, &Filter::all().eq("board_id", "b1")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "l1");
        assert!(store.select(Table::Cards, &Filter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let store = MemoryStore::new();
        store.insert(Table::CardLabels, json!({"id": "c1:l1"})).await.unwrap();
        let err = store.insert(Table::CardLabels, json!({"id": "c1:l1"})).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_merges_matching_rows() {
        let store = MemoryStore::new();
        store.insert(Table::Cards, json!({"id": "c1", "list_id": "l1", "title": "a"})).await.unwrap();
        store.insert(Table::Cards, json!({"id": "c2", "list_id": "l2", "title": "b"})).await.unwrap();

        let updated = store
            .update(Table::Cards, &Filter::by_id("c1"), json!({"title": "renamed"}))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["title"], "renamed");
        assert_eq!(updated[0]["list_id"], "l1");

        let other = store.select(Table::Cards, &Filter::by_id("c2")).await.unwrap();
        assert_eq!(other[0]["title"], "b");
    }

    #[tokio::test]
    async fn test_delete_returns_removed_rows() {
        let store = MemoryStore::new();
        for id in ["c1", "c2", "c3"] {
            store.insert(Table::Cards, json!({"id": id, "list_id": if id == "c3" { "l2" } else { "l1" }})).await.unwrap();
        }
        let removed = store.delete(Table::Cards, &Filter::all().eq("list_id", "l1")).await.unwrap();
        assert_eq!(removed.len(), 2);
        let left = store.select(Table::Cards, &Filter::all()).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0]["id"], "c3");
    }

    #[tokio::test]
    async fn test_upsert_merges_or_inserts() {
        let store = MemoryStore::new();
        store.insert(Table::Lists, json!({"id": "l1", "title": "Todo", "position": 1000})).await.unwrap();

        let rows = store
            .upsert(
                Table::Lists,
                vec![json!({"id": "l1", "position": 2000}), json!({"id": "l2", "title": "Done", "position": 1000})],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], json!({"id": "l1", "title": "Todo", "position": 2000}));

        let all = store.select(Table::Lists, &Filter::all()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
