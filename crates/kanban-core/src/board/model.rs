//! Board models.

use serde::{Deserialize, Serialize};

use kanban_db::boards::BoardRow;
pub use kanban_db::boards::Visibility;

use crate::activity::Activity;
use crate::label::Label;
use crate::list::List;
use crate::member::Member;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub title: String,
    pub visibility: Visibility,
    pub workspace_id: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BoardRow> for Board {
    fn from(row: BoardRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            visibility: row.visibility,
            workspace_id: row.workspace_id,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Full board state, used for initial load and client resync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub board: Board,
    pub lists: Vec<List>,
    pub labels: Vec<Label>,
    pub members: Vec<Member>,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBoard {
    pub title: String,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    #[serde(default)]
    pub workspace_id: Option<String>,
}

fn default_visibility() -> Visibility {
    Visibility::Private
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}
