//! Application state.

use std::sync::Arc;

use kanban_db::DbPool;
use kanban_realtime::{BoardEvent, RealtimeHub};

use crate::auth::{Authenticator, SessionTokenAuthenticator};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub hub: RealtimeHub,
    pub auth: Arc<dyn Authenticator>,
    /// Token required by the admin publish endpoint. `None` disables it.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(db: DbPool, hub: RealtimeHub) -> Self {
        Self {
            db,
            hub,
            auth: Arc::new(SessionTokenAuthenticator),
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_authenticator(mut self, auth: Arc<dyn Authenticator>) -> Self {
        self.auth = auth;
        self
    }

    /// Queue an event for every stream of `board_id`.
    pub fn publish(&self, board_id: &str, event: BoardEvent) {
        tracing::debug!(board_id, event = event.kind(), "Publishing event");
        self.hub.publish(board_id, event);
    }
}
