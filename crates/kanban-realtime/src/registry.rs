//! Connection registry.
//!
//! Process-wide map of open streams. Callers always get snapshot copies, so
//! writers never hold a map lock while doing I/O.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::sink::EventSink;

/// Unique id of one open stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One open stream.
#[derive(Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub board_id: String,
    pub user_id: String,
    pub sink: Arc<dyn EventSink>,
    pub connected_at: DateTime<Utc>,
    /// Last successful write, or registration time.
    pub last_touched_at: DateTime<Utc>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("board_id", &self.board_id)
            .field("user_id", &self.user_id)
            .field("connected_at", &self.connected_at)
            .field("last_touched_at", &self.last_touched_at)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new stream and return its fresh id.
    pub fn register(&self, board_id: &str, user_id: &str, sink: Arc<dyn EventSink>) -> ConnectionId {
        self.register_at(board_id, user_id, sink, Utc::now())
    }

    pub fn register_at(
        &self,
        board_id: &str,
        user_id: &str,
        sink: Arc<dyn EventSink>,
        now: DateTime<Utc>,
    ) -> ConnectionId {
        let id = ConnectionId::new();
        let connection = Connection {
            id,
            board_id: board_id.to_string(),
            user_id: user_id.to_string(),
            sink,
            connected_at: now,
            last_touched_at: now,
        };
        self.connections.insert(id, connection);
        tracing::debug!(connection_id = %id, board_id, user_id, "Connection registered");
        id
    }

    /// Remove a stream and close its sink. Returns `false` when the id was
    /// already gone.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        match self.connections.remove(id) {
            Some((_, connection)) => {
                connection.sink.close();
                tracing::debug!(connection_id = %id, board_id = %connection.board_id, "Connection unregistered");
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &ConnectionId) -> Option<Connection> {
        self.connections.get(id).map(|entry| entry.value().clone())
    }

    /// Snapshot of the streams subscribed to `board_id`.
    pub fn list_by_board(&self, board_id: &str) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|entry| entry.board_id == board_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Snapshot of every stream.
    pub fn list_all(&self) -> Vec<Connection> {
        self.connections.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Mark a successful write.
    pub fn touch(&self, id: &ConnectionId) {
        self.touch_at(id, Utc::now());
    }

    /// Mark a successful write at `at`. Never moves the timestamp backwards.
    pub fn touch_at(&self, id: &ConnectionId, at: DateTime<Utc>) {
        if let Some(mut entry) = self.connections.get_mut(id) {
            if at > entry.last_touched_at {
                entry.last_touched_at = at;
            }
        }
    }

    /// Evict every stream untouched for longer than `max_age`. Returns the
    /// number evicted.
    pub fn sweep_stale(&self, max_age: Duration) -> usize {
        self.sweep_stale_at(Utc::now(), max_age)
    }

    pub fn sweep_stale_at(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| now.checked_sub_signed(age))
        else {
            return 0;
        };

        let stale: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|entry| entry.last_touched_at < cutoff)
            .map(|entry| *entry.key())
            .collect();

        let mut evicted = 0;
        for id in stale {
            // A write may have touched it since the scan.
            if let Some((_, connection)) = self
                .connections
                .remove_if(&id, |_, c| c.last_touched_at < cutoff)
            {
                connection.sink.close();
                evicted += 1;
                tracing::debug!(
                    connection_id = %id,
                    board_id = %connection.board_id,
                    user_id = %connection.user_id,
                    "Evicted stale connection"
                );
            }
        }
        evicted
    }

    /// Unregister every stream of `board_id`. Used when the board is deleted.
    pub fn unregister_board(&self, board_id: &str) -> usize {
        self.list_by_board(board_id)
            .iter()
            .filter(|connection| self.unregister(&connection.id))
            .count()
    }

    /// Unregister every stream, ending all client streams. Used on shutdown.
    pub fn close_all(&self) -> usize {
        let ids: Vec<ConnectionId> = self.connections.iter().map(|entry| *entry.key()).collect();
        ids.iter().filter(|id| self.unregister(id)).count()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn count_by_board(&self, board_id: &str) -> usize {
        self.connections.iter().filter(|entry| entry.board_id == board_id).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ChannelSink;
    use std::collections::HashSet;

    fn sink() -> Arc<ChannelSink> {
        ChannelSink::new(4).0
    }

    #[test]
    fn test_unregister_is_idempotent_and_closes() {
        let registry = ConnectionRegistry::new();
        let s = sink();
        let id = registry.register("b1", "u1", s.clone());

        assert!(registry.unregister(&id));
        assert!(s.is_closed());
        assert!(!registry.unregister(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_same_user_and_board_get_distinct_ids() {
        let registry = ConnectionRegistry::new();
        let a = registry.register("b1", "u1", sink());
        let b = registry.register("b1", "u1", sink());
        assert_ne!(a, b);
        assert_eq!(registry.count_by_board("b1"), 2);
    }

    #[test]
    fn test_list_by_board_is_a_snapshot() {
        let registry = ConnectionRegistry::new();
        let id = registry.register("b1", "u1", sink());
        registry.register("b2", "u2", sink());

        let snapshot = registry.list_by_board("b1");
        registry.unregister(&id);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
        assert!(registry.list_by_board("b1").is_empty());
    }

    #[test]
    fn test_sweep_removes_only_stale() {
        let registry = ConnectionRegistry::new();
        let now = Utc::now();
        let old_sink = sink();
        let old = registry.register_at("b1", "u1", old_sink.clone(), now - chrono::Duration::minutes(10));
        let fresh = registry.register_at("b1", "u2", sink(), now - chrono::Duration::minutes(2));

        let evicted = registry.sweep_stale_at(now, Duration::from_secs(300));
        assert_eq!(evicted, 1);
        assert!(registry.get(&old).is_none());
        assert!(old_sink.is_closed());
        assert!(registry.get(&fresh).is_some());
    }

    #[test]
    fn test_touch_rescues_from_sweep() {
        let registry = ConnectionRegistry::new();
        let now = Utc::now();
        let id = registry.register_at("b1", "u1", sink(), now - chrono::Duration::minutes(10));
        registry.touch_at(&id, now - chrono::Duration::minutes(1));

        // Older timestamps are ignored.
        registry.touch_at(&id, now - chrono::Duration::minutes(20));
        assert_eq!(registry.get(&id).unwrap().last_touched_at, now - chrono::Duration::minutes(1));

        assert_eq!(registry.sweep_stale_at(now, Duration::from_secs(300)), 0);
    }

    #[test]
    fn test_registration_does_not_touch() {
        let registry = ConnectionRegistry::new();
        let at = Utc::now() - chrono::Duration::minutes(3);
        let id = registry.register_at("b1", "u1", sink(), at);
        let connection = registry.get(&id).unwrap();
        assert_eq!(connection.connected_at, at);
        assert_eq!(connection.last_touched_at, at);
    }

    #[test]
    fn test_close_all() {
        let registry = ConnectionRegistry::new();
        let a = sink();
        registry.register("b1", "u1", a.clone());
        registry.register("b2", "u2", sink());
        assert_eq!(registry.close_all(), 2);
        assert!(registry.is_empty());
        assert!(a.is_closed());
    }

    #[test]
    fn test_unregister_board() {
        let registry = ConnectionRegistry::new();
        let a = sink();
        registry.register("b1", "u1", a.clone());
        registry.register("b1", "u2", sink());
        let other = registry.register("b2", "u1", sink());

        assert_eq!(registry.unregister_board("b1"), 2);
        assert!(a.is_closed());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&other).is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_is_board_scoped() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut tasks = Vec::new();
        for i in 0..64 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let board = if i % 2 == 0 { "x" } else { "y" };
                (board, registry.register(board, "u1", sink()))
            }));
        }

        let mut ids_x = HashSet::new();
        for task in tasks {
            let (board, id) = task.await.unwrap();
            if board == "x" {
                ids_x.insert(id);
            }
        }

        let listed: HashSet<ConnectionId> = registry.list_by_board("x").iter().map(|c| c.id).collect();
        assert_eq!(listed, ids_x);
        assert_eq!(registry.len(), 64);
        assert!(registry.list_by_board("x").iter().all(|c| c.board_id == "x"));
    }
}
