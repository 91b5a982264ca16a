//! Workspaces and workspace membership.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{boards, decode, decode_all, encode};
use crate::client::{DbError, DbPool, DbResult, Table};
use crate::filter::Filter;
use crate::now_timestamp;

/// Name of the workspace created for a user who has none.
pub const DEFAULT_WORKSPACE_NAME: &str = "Personal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRow {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMemberRow {
    pub id: String,
    pub workspace_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: String,
}

fn member_id(workspace_id: &str, user_id: &str) -> String {
    format!("{}:{}", workspace_id, user_id)
}

pub async fn create_workspace(pool: &DbPool, name: &str, created_by: &str) -> DbResult<WorkspaceRow> {
    let now = now_timestamp();
    let row = WorkspaceRow {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        created_by: created_by.to_string(),
        created_at: now.clone(),
        updated_at: now,
    };
    decode(pool.insert(Table::Workspaces, encode(&row)?).await?)
}

pub async fn get_workspace(pool: &DbPool, workspace_id: &str) -> DbResult<WorkspaceRow> {
    match pool.select(Table::Workspaces, &Filter::by_id(workspace_id)).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Workspace: {}", workspace_id))),
    }
}

/// Workspaces created by `user_id`, oldest first.
pub async fn list_owned_workspaces(pool: &DbPool, user_id: &str) -> DbResult<Vec<WorkspaceRow>> {
    let rows = pool
        .select(Table::Workspaces, &Filter::all().eq("created_by", user_id))
        .await?;
    let mut workspaces: Vec<WorkspaceRow> = decode_all(rows)?;
    workspaces.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(workspaces)
}

/// Workspaces `user_id` was added to as a member.
pub async fn list_member_workspaces(pool: &DbPool, user_id: &str) -> DbResult<Vec<WorkspaceRow>> {
    let memberships: Vec<WorkspaceMemberRow> = decode_all(
        pool.select(Table::WorkspaceMembers, &Filter::all().eq("user_id", user_id))
            .await?,
    )?;
    if memberships.is_empty() {
        return Ok(Vec::new());
    }
    let filter = Filter::all().is_in("id", memberships.iter().map(|m| m.workspace_id.as_str()));
    decode_all(pool.select(Table::Workspaces, &filter).await?)
}

pub async fn rename_workspace(pool: &DbPool, workspace_id: &str, name: &str) -> DbResult<WorkspaceRow> {
    let patch = json!({ "name": name, "updated_at": now_timestamp() });
    match pool.update(Table::Workspaces, &Filter::by_id(workspace_id), patch).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Workspace: {}", workspace_id))),
    }
}

/// Delete a workspace with its memberships and boards. Returns the ids of
/// the deleted boards.
pub async fn delete_workspace(pool: &DbPool, workspace_id: &str) -> DbResult<Vec<String>> {
    get_workspace(pool, workspace_id).await?;

    let board_ids: Vec<String> = pool
        .select(Table::Boards, &Filter::all().eq("workspace_id", workspace_id))
        .await?
        .iter()
        .filter_map(|b| b.get("id").and_then(|v| v.as_str()).map(str::to_string))
        .collect();
    for board_id in &board_ids {
        boards::delete_board(pool, board_id).await?;
    }

    pool.delete(Table::WorkspaceMembers, &Filter::all().eq("workspace_id", workspace_id))
        .await?;
    pool.delete(Table::Workspaces, &Filter::by_id(workspace_id)).await?;
    Ok(board_ids)
}

pub async fn get_workspace_member(
    pool: &DbPool,
    workspace_id: &str,
    user_id: &str,
) -> DbResult<Option<WorkspaceMemberRow>> {
    let filter = Filter::by_id(&member_id(workspace_id, user_id));
    pool.select(Table::WorkspaceMembers, &filter).await?.pop().map(decode).transpose()
}

/// Members of a workspace in join order. The creator is not stored here.
pub async fn list_workspace_members(pool: &DbPool, workspace_id: &str) -> DbResult<Vec<WorkspaceMemberRow>> {
    let rows = pool
        .select(Table::WorkspaceMembers, &Filter::all().eq("workspace_id", workspace_id))
        .await?;
    let mut members: Vec<WorkspaceMemberRow> = decode_all(rows)?;
    members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
    Ok(members)
}

/// Add a member. Adding an existing member is a conflict.
pub async fn add_workspace_member(
    pool: &DbPool,
    workspace_id: &str,
    user_id: &str,
    role: &str,
) -> DbResult<WorkspaceMemberRow> {
    let row = WorkspaceMemberRow {
        id: member_id(workspace_id, user_id),
        workspace_id: workspace_id.to_string(),
        user_id: user_id.to_string(),
        role: role.to_string(),
        joined_at: now_timestamp(),
    };
    decode(pool.insert(Table::WorkspaceMembers, encode(&row)?).await?)
}

pub async fn update_workspace_member_role(
    pool: &DbPool,
    workspace_id: &str,
    user_id: &str,
    role: &str,
) -> DbResult<WorkspaceMemberRow> {
    let filter = Filter::by_id(&member_id(workspace_id, user_id));
    match pool.update(Table::WorkspaceMembers, &filter, json!({ "role": role })).await?.pop() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Member {} in workspace {}", user_id, workspace_id))),
    }
}

pub async fn remove_workspace_member(
    pool: &DbPool,
    workspace_id: &str,
    user_id: &str,
) -> DbResult<WorkspaceMemberRow> {
    let removed = pool
        .delete(Table::WorkspaceMembers, &Filter::by_id(&member_id(workspace_id, user_id)))
        .await?;
    match removed.into_iter().next() {
        Some(row) => decode(row),
        None => Err(DbError::NotFound(format!("Member {} in workspace {}", user_id, workspace_id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boards::Visibility;

    #[tokio::test]
    async fn test_owned_and_member_workspaces() {
        let pool = crate::in_memory();
        let first = create_workspace(&pool, "Personal", "u1").await.unwrap();
        let second = create_workspace(&pool, "Team", "u1").await.unwrap();
        create_workspace(&pool, "Elsewhere", "u2").await.unwrap();

        let owned = list_owned_workspaces(&pool, "u1").await.unwrap();
        assert_eq!(owned, vec![first.clone(), second.clone()]);
        assert!(list_member_workspaces(&pool, "u3").await.unwrap().is_empty());

        add_workspace_member(&pool, &second.id, "u3", "member").await.unwrap();
        assert_eq!(list_member_workspaces(&pool, "u3").await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn test_membership_lifecycle() {
        let pool = crate::in_memory();
        let ws = create_workspace(&pool, "Team", "u1").await.unwrap();

        add_workspace_member(&pool, &ws.id, "u2", "member").await.unwrap();
        assert!(matches!(
            add_workspace_member(&pool, &ws.id, "u2", "admin").await,
            Err(DbError::Conflict(_))
        ));

        let updated = update_workspace_member_role(&pool, &ws.id, "u2", "admin").await.unwrap();
        assert_eq!(updated.role, "admin");
        assert_eq!(get_workspace_member(&pool, &ws.id, "u2").await.unwrap().unwrap().role, "admin");

        remove_workspace_member(&pool, &ws.id, "u2").await.unwrap();
        assert!(list_workspace_members(&pool, &ws.id).await.unwrap().is_empty());
        assert!(matches!(
            update_workspace_member_role(&pool, &ws.id, "u2", "member").await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_workspace_takes_its_boards() {
        let pool = crate::in_memory();
        let ws = create_workspace(&pool, "Team", "u1").await.unwrap();
        let other = create_workspace(&pool, "Other", "u1").await.unwrap();
        let doomed = boards::create_board(&pool, "A", Visibility::Workspace, Some(&ws.id), "u1").await.unwrap();
        let kept = boards::create_board(&pool, "B", Visibility::Workspace, Some(&other.id), "u1").await.unwrap();
        add_workspace_member(&pool, &ws.id, "u2", "member").await.unwrap();

        let deleted = delete_workspace(&pool, &ws.id).await.unwrap();
        assert_eq!(deleted, vec![doomed.id.clone()]);
        assert!(matches!(get_workspace(&pool, &ws.id).await, Err(DbError::NotFound(_))));
        assert!(matches!(boards::get_board(&pool, &doomed.id).await, Err(DbError::NotFound(_))));
        assert!(boards::get_board(&pool, &kept.id).await.is_ok());
        assert!(get_workspace_member(&pool, &ws.id, "u2").await.unwrap().is_none());
    }
}
