//! Board access rules.
//!
//! Read access requires the board to exist; private boards are further
//! restricted to their creator and explicit members. Writes need the creator
//! or a member with the `owner` or `editor` role. Member management is
//! reserved to the creator of a non-private board.

use serde::{Deserialize, Serialize};

use kanban_db::boards::{self, BoardRow, Visibility};
use kanban_db::{members, DbError, DbPool};

use crate::error::{KanbanError, KanbanResult};

/// Role of a board member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Role::Owner),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn can_write(&self) -> bool {
        matches!(self, Role::Owner | Role::Editor)
    }
}

/// Resolved access of one user to one board.
#[derive(Debug, Clone)]
pub struct BoardAccess {
    pub board: BoardRow,
    pub user_id: String,
    /// Membership role, `None` when the user is not an explicit member.
    pub role: Option<Role>,
}

impl BoardAccess {
    pub fn is_creator(&self) -> bool {
        self.board.created_by == self.user_id
    }

    pub fn can_write(&self) -> bool {
        self.is_creator() || self.role.is_some_and(|r| r.can_write())
    }

    pub fn require_write(&self) -> KanbanResult<()> {
        if self.can_write() {
            Ok(())
        } else {
            Err(KanbanError::forbidden("insufficient permissions"))
        }
    }

    pub fn require_member_management(&self) -> KanbanResult<()> {
        if !self.is_creator() {
            return Err(KanbanError::forbidden("only the board owner can manage members"));
        }
        if self.board.visibility == Visibility::Private {
            return Err(KanbanError::forbidden("cannot invite members to private boards"));
        }
        Ok(())
    }
}

/// Resolve `user_id`'s access to `board_id`, failing when the board is not
/// readable by them.
pub async fn authorize_read(pool: &DbPool, board_id: &str, user_id: &str) -> KanbanResult<BoardAccess> {
    let board = match boards::get_board(pool, board_id).await {
        Ok(board) => board,
        Err(DbError::NotFound(_)) => return Err(KanbanError::BoardNotFound(board_id.to_string())),
        Err(e) => return Err(e.into()),
    };

    let role = members::get_member(pool, board_id, user_id)
        .await?
        .map(|m| Role::from_str(&m.role).unwrap_or(Role::Viewer));

    let access = BoardAccess {
        board,
        user_id: user_id.to_string(),
        role,
    };

    if access.board.visibility == Visibility::Private && access.role.is_none() && !access.is_creator() {
        tracing::debug!(board_id, user_id, "Read access denied");
        return Err(KanbanError::AccessDenied);
    }
    Ok(access)
}

/// Resolve access and require write permission.
pub async fn authorize_write(pool: &DbPool, board_id: &str, user_id: &str) -> KanbanResult<BoardAccess> {
    let access = authorize_read(pool, board_id, user_id).await?;
    access.require_write()?;
    Ok(access)
}
