//! Redis-backed record store.
//!
//! Each table is one hash at `{prefix}:{table}` mapping record id to the
//! JSON-encoded record. Multi-row operations are not atomic.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;

use crate::client::{merge, record_id, with_id, DbError, DbResult, RecordStore, Table};
use crate::filter::Filter;

/// Redis connection. ConnectionManager handles multiplexing internally.
/// It is Clone, so callers clone it to get a mutable handle for each operation.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Connect to Redis and namespace every key under `prefix`.
    pub async fn connect(redis_url: &str, prefix: &str) -> DbResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::debug!(prefix = %prefix, "Redis record store connected");
        Ok(Self {
            conn,
            prefix: prefix.to_string(),
        })
    }

    fn key(&self, table: Table) -> String {
        format!("{}:{}", self.prefix, table)
    }

    async fn load(&self, table: Table, filter: &Filter) -> DbResult<Vec<Value>> {
        let mut conn = self.conn.clone();
        let key = self.key(table);

        let raw: Vec<String> = match filter.id_hint() {
            Some(id) => {
                let json: Option<String> = conn.hget(&key, id).await?;
                json.into_iter().collect()
            }
            None => conn.hvals(&key).await?,
        };

        let mut rows = Vec::with_capacity(raw.len());
        for json in raw {
            let row: Value = serde_json::from_str(&json)?;
            if filter.matches(&row) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    async fn store(&self, table: Table, id: &str, row: &Value) -> DbResult<()> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(self.key(table), id, serde_json::to_string(row)?)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn select(&self, table: Table, filter: &Filter) -> DbResult<Vec<Value>> {
        self.load(table, filter).await
    }

    async fn insert(&self, table: Table, record: Value) -> DbResult<Value> {
        let (id, record) = with_id(record)?;
        let mut conn = self.conn.clone();
        let created: bool = conn
            .hset_nx(self.key(table), &id, serde_json::to_string(&record)?)
            .await?;
        if !created {
            return Err(DbError::Conflict(format!("{}: {}", table, id)));
        }
        Ok(record)
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Value) -> DbResult<Vec<Value>> {
        let mut rows = self.load(table, filter).await?;
        for row in rows.iter_mut() {
            merge(row, &patch)?;
            let id = record_id(row)?;
            self.store(table, &id, row).await?;
        }
        Ok(rows)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> DbResult<Vec<Value>> {
        let rows = self.load(table, filter).await?;
        if rows.is_empty() {
            return Ok(rows);
        }
        let ids = rows.iter().map(record_id).collect::<DbResult<Vec<_>>>()?;
        let mut conn = self.conn.clone();
        conn.hdel::<_, _, ()>(self.key(table), ids).await?;
        Ok(rows)
    }

    async fn upsert(&self, table: Table, records: Vec<Value>) -> DbResult<Vec<Value>> {
        let mut result = Vec::with_capacity(records.len());
        for record in records {
            let (id, record) = with_id(record)?;
            let row = match self.load(table, &Filter::by_id(&id)).await?.pop() {
                Some(mut existing) => {
                    merge(&mut existing, &record)?;
                    existing
                }
                None => record,
            };
            self.store(table, &id, &row).await?;
            result.push(row);
        }
        Ok(result)
    }
}
