//! Card route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use kanban_core::card::{self, Card, CardMove, CardUpdate, MoveCard, NewCard};
use kanban_core::list::List;
use kanban_db::cards::CardPlacement;
use kanban_realtime::BoardEvent;

use super::success;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReorderCardsRequest {
    pub cards: Vec<CardPlacement>,
}

pub async fn get_card(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    user: CurrentUser,
) -> ApiResult<Json<Card>> {
    let card = card::get_card(&state.db, user.id(), &id, &card_id).await?;
    Ok(Json(card))
}

pub async fn create_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(req): Json<NewCard>,
) -> ApiResult<(StatusCode, Json<Card>)> {
    let card = card::create_card(&state.db, user.id(), &id, &req).await?;

    state.publish(&id, BoardEvent::card_created(card.clone()));

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn update_card(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    user: CurrentUser,
    Json(req): Json<CardUpdate>,
) -> ApiResult<Json<Card>> {
    let card = card::update_card(&state.db, user.id(), &id, &card_id, &req).await?;

    state.publish(&id, BoardEvent::card_updated(card.clone()));

    Ok(Json(card))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    user: CurrentUser,
) -> ApiResult<Json<Value>> {
    let card = card::delete_card(&state.db, user.id(), &id, &card_id).await?;

    state.publish(
        &id,
        BoardEvent::CardDeleted {
            card_id: card.id,
            list_id: card.list_id,
        },
    );

    Ok(success())
}

pub async fn move_card(
    State(state): State<AppState>,
    Path((id, card_id)): Path<(String, String)>,
    user: CurrentUser,
    Json(req): Json<MoveCard>,
) -> ApiResult<Json<Card>> {
    let CardMove {
        card,
        from_list_id,
        to_list_id,
        position,
    } = card::move_card(&state.db, user.id(), &id, &card_id, &req).await?;

    state.publish(
        &id,
        BoardEvent::CardMoved {
            card_id: card.id.clone(),
            from_list_id,
            to_list_id,
            position,
            card: card.clone(),
        },
    );

    Ok(Json(card))
}

pub async fn reorder_cards(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    Json(req): Json<ReorderCardsRequest>,
) -> ApiResult<Json<Vec<List>>> {
    let lists = card::reorder_cards(&state.db, user.id(), &id, &req.cards).await?;

    state.publish(&id, BoardEvent::CardsReordered { lists: lists.clone() });

    Ok(Json(lists))
}
