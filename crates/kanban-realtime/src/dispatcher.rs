//! Broadcast dispatcher.
//!
//! `broadcast` writes one event to every stream of a board and waits for the
//! writes. `publish` queues the event on the board's FIFO and returns at once;
//! a worker per board drains the queue through `broadcast`, so events reach
//! each stream in publish order.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::mpsc;

use crate::config::RealtimeConfig;
use crate::event::BoardEvent;
use crate::frame::{encode_frame, KEEP_ALIVE_FRAME};
use crate::registry::{Connection, ConnectionRegistry};
use crate::sink::SinkError;

/// Delivery counts of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<ConnectionRegistry>,
    write_timeout: Duration,
    queue_idle: Duration,
    queues: DashMap<String, mpsc::UnboundedSender<BoardEvent>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>, config: &RealtimeConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                write_timeout: config.write_timeout(),
                queue_idle: config.queue_idle(),
                queues: DashMap::new(),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.inner.registry
    }

    /// Write `event` to every stream of `board_id`.
    ///
    /// Each write runs independently under the write timeout. Successful
    /// writes touch their connection; failed ones unregister it. Nothing is
    /// retried and no error reaches the caller.
    pub async fn broadcast(&self, board_id: &str, event: &BoardEvent) -> BroadcastReport {
        let connections = self.inner.registry.list_by_board(board_id);
        if connections.is_empty() {
            tracing::trace!(board_id, event = event.kind(), "No subscribers");
            return BroadcastReport::default();
        }

        let frame = match encode_frame(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(board_id, event = event.kind(), error = %e, "Failed to encode event");
                return BroadcastReport::default();
            }
        };

        let report = self.deliver(connections, frame, true).await;
        tracing::debug!(
            board_id,
            event = event.kind(),
            delivered = report.delivered,
            dropped = report.dropped,
            "Broadcast complete"
        );
        report
    }

    /// Send a keep-alive comment to every stream.
    ///
    /// Keep-alives do not count as activity: a stream that only ever receives
    /// them still ages out through the stale sweep. A failed write evicts.
    pub async fn heartbeat(&self) -> BroadcastReport {
        let connections = self.inner.registry.list_all();
        if connections.is_empty() {
            return BroadcastReport::default();
        }
        let report = self.deliver(connections, Bytes::from_static(KEEP_ALIVE_FRAME), false).await;
        tracing::trace!(delivered = report.delivered, dropped = report.dropped, "Heartbeat sent");
        report
    }

    /// Write `frame` to every connection and wait for all writes. One slow
    /// connection holds the caller, and so the board's queue, for at most the
    /// write timeout before it is evicted.
    async fn deliver(&self, connections: Vec<Connection>, frame: Bytes, touch: bool) -> BroadcastReport {
        let write_timeout = self.inner.write_timeout;
        let writes = connections.into_iter().map(|connection| {
            let frame = frame.clone();
            async move {
                let result = match tokio::time::timeout(write_timeout, connection.sink.write(frame)).await {
                    Ok(result) => result,
                    Err(_) => Err(SinkError::Timeout(write_timeout)),
                };
                (connection, result)
            }
        });

        let registry = &self.inner.registry;
        let mut report = BroadcastReport::default();
        for (connection, result) in join_all(writes).await {
            match result {
                Ok(()) => {
                    if touch {
                        registry.touch(&connection.id);
                    }
                    report.delivered += 1;
                }
                Err(e) => {
                    registry.unregister(&connection.id);
                    report.dropped += 1;
                    tracing::debug!(
                        connection_id = %connection.id,
                        board_id = %connection.board_id,
                        user_id = %connection.user_id,
                        error = %e,
                        "Dropped connection after failed write"
                    );
                }
            }
        }
        report
    }

    /// Queue `event` for `board_id` without waiting for delivery.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn publish(&self, board_id: &str, event: BoardEvent) {
        let event = match self.enqueue(board_id, event) {
            Ok(()) => return,
            Err(event) => event,
        };

        // The worker is gone without having removed its queue; replace it.
        self.inner
            .queues
            .remove_if(board_id, |_, tx| tx.is_closed());
        if self.enqueue(board_id, event).is_err() {
            tracing::error!(board_id, "Failed to queue event");
        }
    }

    fn enqueue(&self, board_id: &str, event: BoardEvent) -> Result<(), BoardEvent> {
        // Sends happen under the shard lock so a worker can only retire while
        // its queue is provably empty.
        let tx = self
            .inner
            .queues
            .entry(board_id.to_string())
            .or_insert_with(|| self.spawn_worker(board_id));
        tx.send(event).map_err(|e| e.0)
    }

    fn spawn_worker(&self, board_id: &str) -> mpsc::UnboundedSender<BoardEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_board_queue(self.clone(), board_id.to_string(), tx.clone(), rx));
        tracing::debug!(board_id, "Started board queue");
        tx
    }

    /// Number of boards with a live publish worker.
    pub fn active_queues(&self) -> usize {
        self.inner.queues.len()
    }
}

async fn run_board_queue(
    dispatcher: Dispatcher,
    board_id: String,
    own: mpsc::UnboundedSender<BoardEvent>,
    mut rx: mpsc::UnboundedReceiver<BoardEvent>,
) {
    let idle = dispatcher.inner.queue_idle;
    loop {
        match tokio::time::timeout(idle, rx.recv()).await {
            Ok(Some(event)) => {
                dispatcher.broadcast(&board_id, &event).await;
            }
            Ok(None) => break,
            Err(_) => {
                let retired = dispatcher
                    .inner
                    .queues
                    .remove_if(&board_id, |_, tx| tx.same_channel(&own) && rx.is_empty())
                    .is_some();
                if retired {
                    tracing::debug!(board_id = %board_id, "Board queue idle, stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ChannelSink, EventSink};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSink {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl EventSink for FailingSink {
        async fn write(&self, _frame: Bytes) -> Result<(), SinkError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(SinkError::Transport("connection reset".into()))
        }

        fn close(&self) {}

        fn is_closed(&self) -> bool {
            false
        }
    }

    struct StalledSink;

    #[async_trait]
    impl EventSink for StalledSink {
        async fn write(&self, _frame: Bytes) -> Result<(), SinkError> {
            std::future::pending().await
        }

        fn close(&self) {}

        fn is_closed(&self) -> bool {
            false
        }
    }

    fn setup() -> (Arc<ConnectionRegistry>, Dispatcher) {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone(), &RealtimeConfig::default());
        (registry, dispatcher)
    }

    fn event(list_id: &str) -> BoardEvent {
        BoardEvent::ListDeleted {
            list_id: list_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_board_is_noop() {
        let (_, dispatcher) = setup();
        assert_eq!(dispatcher.broadcast("b1", &event("l1")).await, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        let (registry, dispatcher) = setup();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (sink, rx) = ChannelSink::new(8);
            registry.register("b1", "u1", sink);
            receivers.push(rx);
        }
        let failing = Arc::new(FailingSink {
            writes: AtomicUsize::new(0),
        });
        let failing_id = registry.register("b1", "u2", failing.clone());

        let report = dispatcher.broadcast("b1", &event("l1")).await;
        assert_eq!(report, BroadcastReport { delivered: 3, dropped: 1 });
        assert!(registry.get(&failing_id).is_none());
        assert_eq!(registry.count_by_board("b1"), 3);
        for rx in receivers.iter_mut() {
            let frame = rx.recv().await.unwrap();
            assert!(frame.starts_with(b"data: {\"type\":\"list_deleted\""));
        }

        // Evicted connections are not written again.
        dispatcher.broadcast("b1", &event("l2")).await;
        assert_eq!(failing.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_write_times_out() {
        let (registry, dispatcher) = setup();
        let (sink, mut rx) = ChannelSink::new(8);
        let healthy = registry.register("b1", "u1", sink);
        let stalled = registry.register("b1", "u2", Arc::new(StalledSink));

        let report = dispatcher.broadcast("b1", &event("l1")).await;
        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 1 });
        assert!(registry.get(&healthy).is_some());
        assert!(registry.get(&stalled).is_none());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_success_touches_connection() {
        let (registry, dispatcher) = setup();
        let (sink, _rx) = ChannelSink::new(8);
        let old = chrono::Utc::now() - chrono::Duration::minutes(10);
        let id = registry.register_at("b1", "u1", sink, old);

        dispatcher.broadcast("b1", &event("l1")).await;
        assert!(registry.get(&id).unwrap().last_touched_at > old);
    }

    #[tokio::test]
    async fn test_closed_sink_after_unregister_is_skipped() {
        let (registry, dispatcher) = setup();
        let (sink, _rx) = ChannelSink::new(8);
        let id = registry.register("b1", "u1", sink.clone());
        registry.unregister(&id);

        let report = dispatcher.broadcast("b1", &event("l1")).await;
        assert_eq!(report, BroadcastReport::default());
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn test_publish_preserves_order() {
        let (registry, dispatcher) = setup();
        let (sink, mut rx) = ChannelSink::new(64);
        registry.register("b1", "u1", sink);

        for i in 0..20 {
            dispatcher.publish("b1", event(&format!("l{}", i)));
        }
        for i in 0..20 {
            let frame = rx.recv().await.unwrap();
            let expected = format!("\"listId\":\"l{}\"", i);
            assert!(std::str::from_utf8(&frame).unwrap().contains(&expected));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_boards_do_not_cross_talk() {
        let (registry, dispatcher) = setup();
        let (sink_x, mut rx_x) = ChannelSink::new(256);
        let (sink_y, mut rx_y) = ChannelSink::new(256);
        registry.register("x", "u1", sink_x);
        registry.register("y", "u2", sink_y);

        let mut tasks = Vec::new();
        for board in ["x", "y"] {
            let dispatcher = dispatcher.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    dispatcher.broadcast(board, &event(&format!("{}-{}", board, i))).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        for (rx, board) in [(&mut rx_x, "x"), (&mut rx_y, "y")] {
            for i in 0..50 {
                let frame = rx.recv().await.unwrap();
                let expected = format!("\"listId\":\"{}-{}\"", board, i);
                assert!(std::str::from_utf8(&frame).unwrap().contains(&expected));
            }
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_queue_retires() {
        let (registry, dispatcher) = setup();
        let (sink, mut rx) = ChannelSink::new(8);
        registry.register("b1", "u1", sink);

        dispatcher.publish("b1", event("l1"));
        assert!(rx.recv().await.is_some());
        assert_eq!(dispatcher.active_queues(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert_eq!(dispatcher.active_queues(), 0);

        dispatcher.publish("b1", event("l2"));
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_heartbeat_reaches_every_board() {
        let (registry, dispatcher) = setup();
        let (a, mut rx_a) = ChannelSink::new(8);
        let (b, mut rx_b) = ChannelSink::new(8);
        registry.register("b1", "u1", a);
        registry.register("b2", "u2", b);

        let report = dispatcher.heartbeat().await;
        assert_eq!(report.delivered, 2);
        assert_eq!(&rx_a.recv().await.unwrap()[..], KEEP_ALIVE_FRAME);
        assert_eq!(&rx_b.recv().await.unwrap()[..], KEEP_ALIVE_FRAME);
    }

    #[tokio::test]
    async fn test_heartbeat_does_not_keep_stale_streams_alive() {
        let (registry, dispatcher) = setup();
        let (sink, _rx) = ChannelSink::new(64);
        let old = chrono::Utc::now() - chrono::Duration::minutes(10);
        let id = registry.register_at("b1", "u1", sink, old);

        for _ in 0..20 {
            assert_eq!(dispatcher.heartbeat().await.delivered, 1);
        }
        assert_eq!(registry.get(&id).unwrap().last_touched_at, old);

        assert_eq!(registry.sweep_stale(Duration::from_secs(300)), 1);
        assert!(registry.get(&id).is_none());
    }

    #[tokio::test]
    async fn test_failed_heartbeat_evicts() {
        let (registry, dispatcher) = setup();
        let failing = Arc::new(FailingSink {
            writes: AtomicUsize::new(0),
        });
        let id = registry.register("b1", "u1", failing);

        let report = dispatcher.heartbeat().await;
        assert_eq!(report, BroadcastReport { delivered: 0, dropped: 1 });
        assert!(registry.get(&id).is_none());
    }
}
