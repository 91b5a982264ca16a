//! Hub and subscription streams.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::RealtimeConfig;
use crate::dispatcher::Dispatcher;
use crate::event::BoardEvent;
use crate::frame::encode_frame;
use crate::maintenance::spawn_maintenance;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::sink::{ChannelSink, EventSink};

/// Registry, dispatcher and settings, built once at start-up and shared by
/// every handler.
#[derive(Clone)]
pub struct RealtimeHub {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Dispatcher,
    config: RealtimeConfig,
}

impl RealtimeHub {
    pub fn new(config: RealtimeConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone(), &config);
        Self {
            registry,
            dispatcher,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Queue an event for every subscriber of `board_id`.
    pub fn publish(&self, board_id: &str, event: BoardEvent) {
        self.dispatcher.publish(board_id, event);
    }

    /// Open a stream on `board_id` for `user_id`.
    ///
    /// The `connected` frame is buffered before the stream is registered, so
    /// it is always the first frame the client sees.
    pub async fn subscribe(&self, board_id: &str, user_id: &str) -> Subscription {
        let (sink, rx) = ChannelSink::new(self.config.sink_buffer());

        match encode_frame(&BoardEvent::connected()) {
            Ok(frame) => {
                if let Err(e) = sink.write(frame).await {
                    tracing::debug!(board_id, user_id, error = %e, "Failed to write connected frame");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode connected frame"),
        }

        let id = self.registry.register(board_id, user_id, sink);
        tracing::info!(
            connection_id = %id,
            board_id,
            user_id,
            board_connections = self.registry.count_by_board(board_id),
            "Client connected"
        );

        Subscription {
            id,
            board_id: board_id.to_string(),
            registry: self.registry.clone(),
            frames: ReceiverStream::new(rx),
        }
    }

    /// Start the sweep and keep-alive task.
    pub fn spawn_maintenance(&self) -> JoinHandle<()> {
        spawn_maintenance(self.dispatcher.clone(), &self.config)
    }
}

/// Frames of one open stream.
///
/// Dropping the subscription, which happens when the client goes away and
/// the response body is dropped, unregisters the connection.
pub struct Subscription {
    id: ConnectionId,
    board_id: String,
    registry: Arc<ConnectionRegistry>,
    frames: ReceiverStream<Bytes>,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }
}

impl Stream for Subscription {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.frames).poll_next(cx).map(|frame| frame.map(Ok))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.registry.unregister(&self.id) {
            tracing::info!(connection_id = %self.id, board_id = %self.board_id, "Client disconnected");
        }
    }
}
