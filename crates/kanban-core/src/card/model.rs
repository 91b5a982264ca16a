//! Card models.

use serde::{Deserialize, Deserializer, Serialize};

use kanban_db::cards::CardRow;

use crate::label::Label;
use crate::member::Profile;

/// A card with its labels and assignees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub board_id: String,
    pub list_id: String,
    pub title: String,
    pub description: String,
    pub position: i64,
    pub due_date: Option<String>,
    pub archived: bool,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignees: Vec<Profile>,
}

impl Card {
    pub(crate) fn from_row(row: CardRow, labels: Vec<Label>, assignees: Vec<Profile>) -> Self {
        Self {
            id: row.id,
            board_id: row.board_id,
            list_id: row.list_id,
            title: row.title,
            description: row.description,
            position: row.position,
            due_date: row.due_date,
            archived: row.archived,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            labels,
            assignees,
        }
    }
}

/// Input for a new card.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCard {
    pub list_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial card update. A `due_date` of `null` clears it, an absent one
/// leaves it unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub archived: Option<bool>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Move request: destination list and zero-based index within it.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveCard {
    pub to_list_id: String,
    #[serde(default)]
    pub position: usize,
}

/// Outcome of a move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardMove {
    pub card: Card,
    pub from_list_id: String,
    pub to_list_id: String,
    /// Zero-based index of the card in the destination list.
    pub position: usize,
}
