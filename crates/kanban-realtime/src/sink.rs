//! Write handles for open streams.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

/// Why a frame could not be written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Sink closed")]
    Closed,

    #[error("Write timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// The outbound half of one streaming connection.
///
/// A sink is owned by exactly one registry entry. Closing is idempotent and
/// ends the client's stream.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Write one already-framed chunk.
    async fn write(&self, frame: Bytes) -> Result<(), SinkError>;

    /// Close the sink. Later writes fail with [`SinkError::Closed`].
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Sink backed by a bounded channel whose receiver feeds the HTTP body.
pub struct ChannelSink {
    tx: Mutex<Option<mpsc::Sender<Bytes>>>,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the response body.
    pub fn new(buffer: usize) -> (Arc<Self>, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let sink = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
        });
        (sink, rx)
    }

    fn sender(&self) -> MutexGuard<'_, Option<mpsc::Sender<Bytes>>> {
        self.tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn write(&self, frame: Bytes) -> Result<(), SinkError> {
        let tx = self.sender().clone().ok_or(SinkError::Closed)?;
        tx.send(frame).await.map_err(|_| SinkError::Closed)
    }

    fn close(&self) {
        self.sender().take();
    }

    fn is_closed(&self) -> bool {
        self.sender().as_ref().map_or(true, |tx| tx.is_closed())
    }
}
