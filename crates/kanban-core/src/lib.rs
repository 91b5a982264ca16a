//! Kanban Core Library
//!
//! Domain models, board access rules and the mutation operations behind the
//! HTTP surface. Every mutation returns the full resulting record so callers
//! can publish it unchanged.

pub mod access;
pub mod activity;
pub mod board;
pub mod card;
pub mod comment;
pub mod error;
pub mod label;
pub mod list;
pub mod member;
pub mod workspace;

pub use access::{BoardAccess, Role};
pub use error::{KanbanError, KanbanResult};
