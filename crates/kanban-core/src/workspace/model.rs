//! Workspace models.

use serde::{Deserialize, Serialize};

use kanban_db::workspaces::WorkspaceRow;

use crate::member::Profile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<WorkspaceRow> for Workspace {
    fn from(row: WorkspaceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Role inside a workspace. The creator is always `owner`; invited users are
/// `member` or `admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Member,
}

impl WorkspaceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceRole::Owner => "owner",
            WorkspaceRole::Admin => "admin",
            WorkspaceRole::Member => "member",
        }
    }

    /// Roles that can be granted to an invited user.
    pub fn assignable(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(WorkspaceRole::Admin),
            "member" => Some(WorkspaceRole::Member),
            _ => None,
        }
    }
}

/// A workspace together with the caller's role in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceView {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub role: WorkspaceRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub user: Profile,
    pub role: WorkspaceRole,
    pub joined_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkspace {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceInvite {
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    WorkspaceRole::Member.as_str().to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleUpdate {
    #[serde(default)]
    pub role: String,
}
