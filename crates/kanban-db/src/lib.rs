//! Kanban Data Layer
//!
//! A small record store abstraction over JSON rows grouped in tables, with an
//! in-process backend and a Redis backend. Typed query modules sit on top of
//! the [`RecordStore`] trait and own the board/list/card position rules.

pub mod client;
pub mod filter;
pub mod memory;
pub mod queries;
pub mod redis_store;

use std::sync::Arc;

pub use client::{DbError, DbPool, DbResult, RecordStore, Table};
pub use filter::{Filter, Predicate};
pub use memory::MemoryStore;
pub use queries::{activities, assignees, boards, cards, comments, labels, lists, members, profiles, workspaces};
pub use redis_store::RedisStore;

/// Create a pool backed by the in-process store.
pub fn in_memory() -> DbPool {
    Arc::new(MemoryStore::new())
}

/// Connect a pool backed by Redis.
///
/// Example URL: `redis://127.0.0.1:6379`
pub async fn init_redis_pool(redis_url: &str, key_prefix: &str) -> DbResult<DbPool> {
    let store = RedisStore::connect(redis_url, key_prefix).await?;
    Ok(Arc::new(store))
}

/// Current time in the fixed-width RFC 3339 form used for every timestamp
/// column, so that string ordering matches chronological ordering.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
