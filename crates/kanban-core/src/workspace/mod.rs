//! Workspaces: named groups of boards with their own member list.
//!
//! Every user owns at least one workspace. The oldest one is the default,
//! created as `Personal` the first time it is needed. Only the owner manages
//! the workspace and its members; owners and admins may create boards in it.

pub mod model;

pub use model::{NewWorkspace, RoleUpdate, Workspace, WorkspaceInvite, WorkspaceMember, WorkspaceRole, WorkspaceView};

use kanban_db::workspaces::{self, WorkspaceRow, DEFAULT_WORKSPACE_NAME};
use kanban_db::{profiles, DbError, DbPool};

use crate::error::{required, KanbanError, KanbanResult};
use crate::member;

const ACCESS_DENIED: &str = "Workspace not found or access denied";

/// Resolve the caller's role in a workspace.
async fn resolve(pool: &DbPool, user_id: &str, workspace_id: &str) -> KanbanResult<(WorkspaceRow, WorkspaceRole)> {
    let workspace = workspaces::get_workspace(pool, workspace_id).await?;
    if workspace.created_by == user_id {
        return Ok((workspace, WorkspaceRole::Owner));
    }
    match workspaces::get_workspace_member(pool, workspace_id, user_id).await? {
        Some(m) => {
            let role = WorkspaceRole::assignable(&m.role).unwrap_or(WorkspaceRole::Member);
            Ok((workspace, role))
        }
        None => Err(KanbanError::forbidden(ACCESS_DENIED)),
    }
}

/// Load a workspace the caller owns. Unknown and foreign workspaces are
/// reported the same way.
async fn owned(pool: &DbPool, user_id: &str, workspace_id: &str) -> KanbanResult<WorkspaceRow> {
    match workspaces::get_workspace(pool, workspace_id).await {
        Ok(ws) if ws.created_by == user_id => Ok(ws),
        Ok(_) | Err(DbError::NotFound(_)) => Err(KanbanError::forbidden(ACCESS_DENIED)),
        Err(e) => Err(e.into()),
    }
}

/// Workspaces the user owns or belongs to, oldest first.
pub async fn list_workspaces(pool: &DbPool, user_id: &str) -> KanbanResult<Vec<WorkspaceView>> {
    let mut result: Vec<WorkspaceView> = workspaces::list_owned_workspaces(pool, user_id)
        .await?
        .into_iter()
        .map(|row| WorkspaceView {
            workspace: row.into(),
            role: WorkspaceRole::Owner,
        })
        .collect();

    for row in workspaces::list_member_workspaces(pool, user_id).await? {
        if result.iter().any(|w| w.workspace.id == row.id) {
            continue;
        }
        let role = workspaces::get_workspace_member(pool, &row.id, user_id)
            .await?
            .and_then(|m| WorkspaceRole::assignable(&m.role))
            .unwrap_or(WorkspaceRole::Member);
        result.push(WorkspaceView {
            workspace: row.into(),
            role,
        });
    }

    result.sort_by(|a, b| a.workspace.created_at.cmp(&b.workspace.created_at));
    Ok(result)
}

pub async fn create_workspace(pool: &DbPool, user_id: &str, name: &str) -> KanbanResult<Workspace> {
    let name = required("Workspace name", name)?;
    let row = workspaces::create_workspace(pool, &name, user_id).await?;
    tracing::info!(workspace_id = %row.id, user_id, "Workspace created");
    Ok(row.into())
}

/// The user's oldest owned workspace, created on first use.
pub async fn default_workspace(pool: &DbPool, user_id: &str) -> KanbanResult<Workspace> {
    if let Some(row) = workspaces::list_owned_workspaces(pool, user_id).await?.into_iter().next() {
        return Ok(row.into());
    }
    tracing::debug!(user_id, "Creating default workspace");
    create_workspace(pool, user_id, DEFAULT_WORKSPACE_NAME).await
}

/// Workspace a new board goes into: the requested one when the user may
/// create boards there, else the default.
pub async fn workspace_for_new_board(pool: &DbPool, user_id: &str, requested: Option<&str>) -> KanbanResult<String> {
    let Some(workspace_id) = requested.filter(|id| !id.is_empty()) else {
        return Ok(default_workspace(pool, user_id).await?.id);
    };
    match resolve(pool, user_id, workspace_id).await {
        Ok((ws, WorkspaceRole::Owner | WorkspaceRole::Admin)) => Ok(ws.id),
        Ok(_) | Err(KanbanError::NotFound(_)) | Err(KanbanError::Forbidden(_)) => {
            Err(KanbanError::forbidden(ACCESS_DENIED))
        }
        Err(e) => Err(e),
    }
}

pub async fn get_workspace(pool: &DbPool, user_id: &str, workspace_id: &str) -> KanbanResult<WorkspaceView> {
    let (row, role) = resolve(pool, user_id, workspace_id).await?;
    Ok(WorkspaceView {
        workspace: row.into(),
        role,
    })
}

pub async fn rename_workspace(pool: &DbPool, user_id: &str, workspace_id: &str, name: &str) -> KanbanResult<Workspace> {
    owned(pool, user_id, workspace_id).await?;
    let name = required("Workspace name", name)?;
    Ok(workspaces::rename_workspace(pool, workspace_id, &name).await?.into())
}

/// Delete a workspace and its boards. Returns the ids of the deleted boards.
pub async fn delete_workspace(pool: &DbPool, user_id: &str, workspace_id: &str) -> KanbanResult<Vec<String>> {
    owned(pool, user_id, workspace_id).await?;
    let board_ids = workspaces::delete_workspace(pool, workspace_id).await?;
    tracing::info!(workspace_id, user_id, boards = board_ids.len(), "Workspace deleted");
    Ok(board_ids)
}

/// Members of a workspace, owner first.
pub async fn list_members(pool: &DbPool, user_id: &str, workspace_id: &str) -> KanbanResult<Vec<WorkspaceMember>> {
    let (workspace, _) = resolve(pool, user_id, workspace_id).await?;
    let rows = workspaces::list_workspace_members(pool, workspace_id).await?;

    let mut ids: Vec<String> = rows.iter().map(|m| m.user_id.clone()).collect();
    ids.push(workspace.created_by.clone());
    let profiles = member::profiles_by_id(pool, &ids).await?;

    let mut result = Vec::with_capacity(rows.len() + 1);
    if let Some(owner) = profiles.get(&workspace.created_by) {
        result.push(WorkspaceMember {
            user: owner.clone(),
            role: WorkspaceRole::Owner,
            joined_at: workspace.created_at.clone(),
        });
    }
    for row in rows {
        if row.user_id == workspace.created_by {
            continue;
        }
        if let Some(profile) = profiles.get(&row.user_id) {
            result.push(WorkspaceMember {
                user: profile.clone(),
                role: WorkspaceRole::assignable(&row.role).unwrap_or(WorkspaceRole::Member),
                joined_at: row.joined_at,
            });
        }
    }
    Ok(result)
}

/// Add the user registered under `email`.
pub async fn add_member(
    pool: &DbPool,
    user_id: &str,
    workspace_id: &str,
    invite: &WorkspaceInvite,
) -> KanbanResult<WorkspaceMember> {
    let email = required("Email", &invite.email)?.to_lowercase();
    let role = WorkspaceRole::assignable(&invite.role).ok_or_else(|| KanbanError::validation("Invalid role"))?;
    let workspace = owned(pool, user_id, workspace_id).await?;

    let invitee = profiles::find_profile_by_email(pool, &email)
        .await?
        .ok_or_else(|| KanbanError::UserNotFound(email.clone()))?;
    if invitee.id == workspace.created_by {
        return Err(KanbanError::Conflict("User is already a member of this workspace".to_string()));
    }

    let row = match workspaces::add_workspace_member(pool, workspace_id, &invitee.id, role.as_str()).await {
        Ok(row) => row,
        Err(DbError::Conflict(_)) => {
            return Err(KanbanError::Conflict("User is already a member of this workspace".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(workspace_id, member_id = %invitee.id, role = role.as_str(), "Workspace member added");
    Ok(WorkspaceMember {
        user: invitee.into(),
        role,
        joined_at: row.joined_at,
    })
}

pub async fn update_member_role(
    pool: &DbPool,
    user_id: &str,
    workspace_id: &str,
    member_id: &str,
    role: &str,
) -> KanbanResult<WorkspaceMember> {
    let role = WorkspaceRole::assignable(role).ok_or_else(|| KanbanError::validation("Invalid role"))?;
    owned(pool, user_id, workspace_id).await?;

    let row = workspaces::update_workspace_member_role(pool, workspace_id, member_id, role.as_str()).await?;
    let user = member::get_profile(pool, &row.user_id).await?;
    Ok(WorkspaceMember {
        user,
        role,
        joined_at: row.joined_at,
    })
}

/// Remove a member. Returns the removed member's user id.
pub async fn remove_member(pool: &DbPool, user_id: &str, workspace_id: &str, member_id: &str) -> KanbanResult<String> {
    owned(pool, user_id, workspace_id).await?;
    let row = workspaces::remove_workspace_member(pool, workspace_id, member_id).await?;
    tracing::info!(workspace_id, member_id = %row.user_id, "Workspace member removed");
    Ok(row.user_id)
}
