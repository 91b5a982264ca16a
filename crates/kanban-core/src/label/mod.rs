//! Board labels and their attachment to cards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use kanban_db::labels::{self, LabelRow};
use kanban_db::{cards, DbError, DbPool};

use crate::access;
use crate::activity;
use crate::error::{required, KanbanError, KanbanResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub board_id: String,
    pub name: String,
    pub color_hex: String,
}

impl From<LabelRow> for Label {
    fn from(row: LabelRow) -> Self {
        Self {
            id: row.id,
            board_id: row.board_id,
            name: row.name,
            color_hex: row.color_hex,
        }
    }
}

pub(crate) async fn labels_by_id(pool: &DbPool, board_id: &str) -> KanbanResult<HashMap<String, Label>> {
    let rows = labels::list_labels(pool, board_id).await?;
    Ok(rows.into_iter().map(|row| (row.id.clone(), Label::from(row))).collect())
}

pub(crate) async fn board_labels(pool: &DbPool, board_id: &str) -> KanbanResult<Vec<Label>> {
    let rows = labels::list_labels(pool, board_id).await?;
    Ok(rows.into_iter().map(Label::from).collect())
}

pub async fn list_labels(pool: &DbPool, user_id: &str, board_id: &str) -> KanbanResult<Vec<Label>> {
    access::authorize_read(pool, board_id, user_id).await?;
    board_labels(pool, board_id).await
}

/// Create a board label. A label with the same name is returned as is, with
/// `false` as the second element.
pub async fn create_label(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    name: &str,
    color_hex: &str,
) -> KanbanResult<(Label, bool)> {
    access::authorize_write(pool, board_id, user_id).await?;
    let name = required("Name", name)?;
    let color_hex = required("Color", color_hex)?;

    if let Some(existing) = labels::find_label_by_name(pool, board_id, &name).await? {
        return Ok((existing.into(), false));
    }

    let label: Label = labels::create_label(pool, board_id, &name, &color_hex).await?.into();
    activity::record(
        pool,
        board_id,
        user_id,
        "label.created",
        json!({ "label_id": label.id, "label_name": label.name, "label_color": label.color_hex }),
    )
    .await;
    Ok((label, true))
}

/// Attach a board label to a card. Attaching an attached label returns the
/// label with `false`.
pub async fn attach_label(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    card_id: &str,
    label_id: &str,
) -> KanbanResult<(Label, bool)> {
    access::authorize_write(pool, board_id, user_id).await?;
    let card = cards::get_card(pool, board_id, card_id).await?;
    let label: Label = labels::get_label(pool, board_id, label_id).await?.into();

    match labels::attach_label(pool, card_id, label_id).await {
        Ok(_) => {}
        Err(DbError::Conflict(_)) => return Ok((label, false)),
        Err(e) => return Err(e.into()),
    }

    activity::record(
        pool,
        board_id,
        user_id,
        "card.labeled",
        json!({
            "card_id": card_id,
            "card_title": card.title,
            "label_id": label.id,
            "label_name": label.name,
        }),
    )
    .await;
    Ok((label, true))
}

pub async fn detach_label(
    pool: &DbPool,
    user_id: &str,
    board_id: &str,
    card_id: &str,
    label_id: &str,
) -> KanbanResult<()> {
    let label_id = required("Label ID", label_id)?;
    access::authorize_write(pool, board_id, user_id).await?;
    let card = cards::get_card(pool, board_id, card_id).await?;

    labels::detach_label(pool, card_id, &label_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => KanbanError::NotFound("Label not found on card".to_string()),
            other => other.into(),
        })?;

    activity::record(
        pool,
        board_id,
        user_id,
        "card.unlabeled",
        json!({ "card_id": card_id, "card_title": card.title, "label_id": label_id }),
    )
    .await;
    Ok(())
}
