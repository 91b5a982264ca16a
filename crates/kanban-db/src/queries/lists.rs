//! List queries.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{cards, decode, decode_all, encode, POSITION_STEP};
use crate::client::{DbError, DbPool, DbResult, Table};
use crate::filter::Filter;
use crate::now_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: String,
    pub board_id: String,
    pub title: String,
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Lists of a board, ordered by position.
pub async fn list_lists(pool: &DbPool, board_id: &str) -> DbResult<Vec<ListRow>> {
    let rows = pool.select(Table::Lists, &Filter::all().eq("board_id", board_id)).await?;
    let mut lists: Vec<ListRow> = decode_all(rows)?;
    lists.sort_by_key(|l| l.position);
    Ok(lists)
}

pub async fn get_list(pool: &DbPool, board_id: &str, list_id: &str) -> DbResult<ListRow> {
    let filter = Filter::by_id(list_id).eq("board_id", board_id);
    match pool.select(Table::Lists, &filter).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("List: {}", list_id))),
    }
}

/// Append a list after the current last one.
pub async fn create_list(pool: &DbPool, board_id: &str, title: &str) -> DbResult<ListRow> {
    let last = list_lists(pool, board_id).await?.last().map(|l| l.position);
    let now = now_timestamp();
    let row = ListRow {
        id: uuid::Uuid::new_v4().to_string(),
        board_id: board_id.to_string(),
        title: title.to_string(),
        position: last.map_or(POSITION_STEP, |p| p + POSITION_STEP),
        created_at: now.clone(),
        updated_at: now,
    };
    decode(pool.insert(Table::Lists, encode(&row)?).await?)
}

pub async fn update_list(
    pool: &DbPool,
    board_id: &str,
    list_id: &str,
    title: Option<&str>,
    position: Option<i64>,
) -> DbResult<ListRow> {
    let mut patch = json!({ "updated_at": now_timestamp() });
    if let Some(title) = title {
        patch["title"] = json!(title);
    }
    if let Some(position) = position {
        patch["position"] = json!(position);
    }
    let filter = Filter::by_id(list_id).eq("board_id", board_id);
    match pool.update(Table::Lists, &filter, patch).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("List: {}", list_id))),
    }
}

/// Delete a list together with its cards.
pub async fn delete_list(pool: &DbPool, board_id: &str, list_id: &str) -> DbResult<ListRow> {
    let list = get_list(pool, board_id, list_id).await?;
    cards::delete_cards_in_list(pool, board_id, list_id).await?;
    pool.delete(Table::Lists, &Filter::by_id(list_id)).await?;
    Ok(list)
}

/// Assign positions `(index + 1) * POSITION_STEP` following `ordered_ids`.
///
/// Every id must belong to the board. Lists not named keep their position.
pub async fn reorder_lists(
    pool: &DbPool,
    board_id: &str,
    ordered_ids: &[String],
) -> DbResult<Vec<ListRow>> {
    let existing = list_lists(pool, board_id).await?;
    if let Some(unknown) = ordered_ids.iter().find(|id| !existing.iter().any(|l| &l.id == *id)) {
        return Err(DbError::NotFound(format!("List: {}", unknown)));
    }

    let now = now_timestamp();
    let patches = ordered_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            json!({
                "id": id,
                "position": (index as i64 + 1) * POSITION_STEP,
                "updated_at": now,
            })
        })
        .collect();
    pool.upsert(Table::Lists, patches).await?;

    list_lists(pool, board_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_appends_with_step() {
        let pool = crate::in_memory();
        let a = create_list(&pool, "b1", "Todo").await.unwrap();
        let b = create_list(&pool, "b1", "Doing").await.unwrap();
        let other = create_list(&pool, "b2", "Elsewhere").await.unwrap();
        assert_eq!(a.position, 1000);
        assert_eq!(b.position, 2000);
        assert_eq!(other.position, 1000);
    }

    #[tokio::test]
    async fn test_reorder() {
        let pool = crate::in_memory();
        let a = create_list(&pool, "b1", "Todo").await.unwrap();
        let b = create_list(&pool, "b1", "Doing").await.unwrap();
        let c = create_list(&pool, "b1", "Done").await.unwrap();

        let lists = reorder_lists(&pool, "b1", &[c.id.clone(), a.id.clone(), b.id.clone()])
            .await
            .unwrap();
        let titles: Vec<_> = lists.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["Done", "Todo", "Doing"]);
        assert_eq!(lists[2].position, 3000);
    }

    #[tokio::test]
    async fn test_reorder_rejects_foreign_list() {
        let pool = crate::in_memory();
        create_list(&pool, "b1", "Todo").await.unwrap();
        let foreign = create_list(&pool, "b2", "Other").await.unwrap();
        let err = reorder_lists(&pool, "b1", &[foreign.id]).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_cards() {
        let pool = crate::in_memory();
        let list = create_list(&pool, "b1", "Todo").await.unwrap();
        cards::create_card(&pool, "b1", &list.id, "Write docs", "", "u1").await.unwrap();

        delete_list(&pool, "b1", &list.id).await.unwrap();
        assert!(list_lists(&pool, "b1").await.unwrap().is_empty());
        assert!(cards::list_cards(&pool, "b1").await.unwrap().is_empty());
    }
}
