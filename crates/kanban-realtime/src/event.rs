//! Board event taxonomy.
//!
//! One variant per mutation kind. Payloads embed full records so a client can
//! apply an event without a follow-up fetch. New kinds get a new variant.

use serde::{Deserialize, Serialize};

use kanban_core::board::Board;
use kanban_core::card::Card;
use kanban_core::comment::Comment;
use kanban_core::label::Label;
use kanban_core::list::List;
use kanban_core::member::{Member, Profile};

use crate::frame::CONNECTED_MESSAGE;

/// Event pushed to every stream subscribed to a board.
///
/// Serialized with an internal `type` tag in snake_case and camelCase payload
/// fields, e.g. `{"type":"card_deleted","cardId":"..","listId":".."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BoardEvent {
    /// First frame on every new stream.
    Connected { message: String },

    ListCreated { list: List },
    ListUpdated {
        list_id: String,
        #[serde(rename = "updatedList")]
        list: List,
    },
    ListDeleted { list_id: String },
    ListsReordered {
        #[serde(rename = "newLists")]
        lists: Vec<List>,
    },

    CardCreated {
        card_id: String,
        list_id: String,
        card: Card,
    },
    CardUpdated {
        card_id: String,
        list_id: String,
        #[serde(rename = "updatedCard")]
        card: Card,
    },
    CardDeleted { card_id: String, list_id: String },
    CardMoved {
        card_id: String,
        from_list_id: String,
        to_list_id: String,
        #[serde(rename = "newPosition")]
        position: usize,
        #[serde(rename = "movedCard")]
        card: Card,
    },
    CardsReordered {
        #[serde(rename = "newLists")]
        lists: Vec<List>,
    },

    CardLabelAdded {
        card_id: String,
        label_id: String,
        label: Label,
    },
    CardLabelRemoved { card_id: String, label_id: String },

    CardAssigneeAdded {
        card_id: String,
        user_id: String,
        assignee: Profile,
    },
    CardAssigneeRemoved { card_id: String, user_id: String },

    CommentAdded { card_id: String, comment: Comment },

    BoardUpdated {
        #[serde(rename = "updatedBoard")]
        board: Board,
    },

    MemberAdded { member: Member },
    MemberRemoved { member_id: String },

    LabelCreated { label: Label },
}

impl BoardEvent {
    pub fn connected() -> Self {
        BoardEvent::Connected {
            message: CONNECTED_MESSAGE.to_string(),
        }
    }

    /// Wire tag of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            BoardEvent::Connected { .. } => "connected",
            BoardEvent::ListCreated { .. } => "list_created",
            BoardEvent::ListUpdated { .. } => "list_updated",
            BoardEvent::ListDeleted { .. } => "list_deleted",
            BoardEvent::ListsReordered { .. } => "lists_reordered",
            BoardEvent::CardCreated { .. } => "card_created",
            BoardEvent::CardUpdated { .. } => "card_updated",
            BoardEvent::CardDeleted { .. } => "card_deleted",
            BoardEvent::CardMoved { .. } => "card_moved",
            BoardEvent::CardsReordered { .. } => "cards_reordered",
            BoardEvent::CardLabelAdded { .. } => "card_label_added",
            BoardEvent::CardLabelRemoved { .. } => "card_label_removed",
            BoardEvent::CardAssigneeAdded { .. } => "card_assignee_added",
            BoardEvent::CardAssigneeRemoved { .. } => "card_assignee_removed",
            BoardEvent::CommentAdded { .. } => "comment_added",
            BoardEvent::BoardUpdated { .. } => "board_updated",
            BoardEvent::MemberAdded { .. } => "member_added",
            BoardEvent::MemberRemoved { .. } => "member_removed",
            BoardEvent::LabelCreated { .. } => "label_created",
        }
    }

    pub fn card_created(card: Card) -> Self {
        BoardEvent::CardCreated {
            card_id: card.id.clone(),
            list_id: card.list_id.clone(),
            card,
        }
    }

    pub fn card_updated(card: Card) -> Self {
        BoardEvent::CardUpdated {
            card_id: card.id.clone(),
            list_id: card.list_id.clone(),
            card,
        }
    }

    pub fn list_updated(list: List) -> Self {
        BoardEvent::ListUpdated {
            list_id: list.id.clone(),
            list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connected_shape() {
        let value = serde_json::to_value(BoardEvent::connected()).unwrap();
        assert_eq!(value, json!({ "type": "connected", "message": "Connected to board updates" }));
    }

    #[test]
    fn test_field_names_are_camel_case() {
        let event = BoardEvent::CardDeleted {
            card_id: "c1".into(),
            list_id: "l1".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({ "type": "card_deleted", "cardId": "c1", "listId": "l1" }));
        assert_eq!(event.kind(), "card_deleted");
    }

    #[test]
    fn test_renamed_payload_fields() {
        let event = BoardEvent::ListsReordered { lists: Vec::new() };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({ "type": "lists_reordered", "newLists": [] }));

        let event = BoardEvent::MemberRemoved { member_id: "u2".into() };
        assert_eq!(serde_json::to_value(&event).unwrap()["memberId"], "u2");
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        let events = vec![
            BoardEvent::connected(),
            BoardEvent::ListDeleted { list_id: "l".into() },
            BoardEvent::CardsReordered { lists: Vec::new() },
            BoardEvent::CardLabelRemoved {
                card_id: "c".into(),
                label_id: "x".into(),
            },
            BoardEvent::CardAssigneeRemoved {
                card_id: "c".into(),
                user_id: "u".into(),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.kind());
        }
    }

    #[test]
    fn test_parses_admin_payload() {
        let event: BoardEvent =
            serde_json::from_str(r#"{"type":"list_deleted","listId":"l9"}"#).unwrap();
        assert_eq!(event, BoardEvent::ListDeleted { list_id: "l9".into() });

        assert!(serde_json::from_str::<BoardEvent>(r#"{"type":"nope"}"#).is_err());
    }
}
