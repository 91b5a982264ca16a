//! Board activity log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode, decode_all, encode};
use crate::client::{DbPool, DbResult, Table};
use crate::filter::Filter;
use crate::now_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub id: String,
    pub board_id: String,
    pub actor_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    pub created_at: String,
}

pub async fn record_activity(
    pool: &DbPool,
    board_id: &str,
    actor_id: &str,
    kind: &str,
    data: Value,
) -> DbResult<ActivityRow> {
    let row = ActivityRow {
        id: uuid::Uuid::new_v4().to_string(),
        board_id: board_id.to_string(),
        actor_id: actor_id.to_string(),
        kind: kind.to_string(),
        data,
        created_at: now_timestamp(),
    };
    decode(pool.insert(Table::Activities, encode(&row)?).await?)
}

/// Most recent activities of a board, newest first.
pub async fn recent_activities(pool: &DbPool, board_id: &str, limit: usize) -> DbResult<Vec<ActivityRow>> {
    let rows = pool
        .select(Table::Activities, &Filter::all().eq("board_id", board_id))
        .await?;
    let mut activities: Vec<ActivityRow> = decode_all(rows)?;
    activities.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    activities.reverse();
    activities.truncate(limit);
    Ok(activities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let pool = crate::in_memory();
        for i in 0..5 {
            record_activity(&pool, "b1", "u1", "card.created", json!({ "n": i })).await.unwrap();
        }
        record_activity(&pool, "b2", "u1", "card.created", json!({})).await.unwrap();

        let recent = recent_activities(&pool, "b1", 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].data["n"], 4);
        assert_eq!(recent[2].data["n"], 2);
    }
}
