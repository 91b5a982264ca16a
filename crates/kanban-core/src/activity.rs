//! Board activity feed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use kanban_db::activities::{self, ActivityRow};
use kanban_db::DbPool;

use crate::error::KanbanResult;

/// Number of activities returned with a board view.
pub const RECENT_ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub board_id: String,
    pub actor_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    pub created_at: String,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.id,
            board_id: row.board_id,
            actor_id: row.actor_id,
            kind: row.kind,
            data: row.data,
            created_at: row.created_at,
        }
    }
}

/// Append an activity for a mutation that has already been stored.
///
/// The feed is secondary to the mutation itself, so a failed insert is
/// logged and otherwise ignored.
pub(crate) async fn record(pool: &DbPool, board_id: &str, actor_id: &str, kind: &str, data: Value) {
    if let Err(e) = activities::record_activity(pool, board_id, actor_id, kind, data).await {
        tracing::warn!(board_id, kind, error = %e, "Failed to record activity");
    }
}

/// Latest activities of a board, newest first.
pub async fn recent(pool: &DbPool, board_id: &str) -> KanbanResult<Vec<Activity>> {
    let rows = activities::recent_activities(pool, board_id, RECENT_ACTIVITY_LIMIT).await?;
    Ok(rows.into_iter().map(Activity::from).collect())
}
