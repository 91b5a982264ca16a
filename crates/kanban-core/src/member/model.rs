//! Profile and member models.

use serde::{Deserialize, Serialize};

use kanban_db::profiles::ProfileRow;

use crate::access::Role;

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            email: row.email,
        }
    }
}

/// A board member: the member's profile plus their role on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(flatten)]
    pub profile: Profile,
    pub role: Role,
}
