//! Kanban Realtime
//!
//! In-process fan-out of board mutation events to every client streaming a
//! board over `text/event-stream`.
//!
//! - [`ConnectionRegistry`] tracks open streams, keyed by connection id and
//!   tagged with board and user.
//! - [`Dispatcher`] serializes an event once and writes it to every stream of
//!   the board, evicting streams whose write fails or times out.
//! - [`spawn_maintenance`] periodically sweeps stale streams and sends
//!   keep-alive comments.
//! - [`RealtimeHub`] ties the three together and hands out [`Subscription`]s.

pub mod config;
pub mod dispatcher;
pub mod event;
pub mod frame;
pub mod hub;
pub mod maintenance;
pub mod registry;
pub mod sink;

pub use config::RealtimeConfig;
pub use dispatcher::{BroadcastReport, Dispatcher};
pub use event::BoardEvent;
pub use frame::{encode_frame, CONNECTED_MESSAGE, KEEP_ALIVE_FRAME};
pub use hub::{RealtimeHub, Subscription};
pub use maintenance::spawn_maintenance;
pub use registry::{Connection, ConnectionId, ConnectionRegistry};
pub use sink::{ChannelSink, EventSink, SinkError};
