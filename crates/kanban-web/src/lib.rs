//! Kanban Web Server
//!
//! Axum-based REST API for workspaces and boards plus the server-sent event stream that
//! fans board mutations out to connected clients.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let board_routes = Router::new()
        .route(
            "/",
            get(routes::boards::get_board)
                .put(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        // Lists
        .route("/lists", post(routes::lists::create_list).put(routes::lists::reorder_lists))
        .route(
            "/lists/{list_id}",
            put(routes::lists::update_list).delete(routes::lists::delete_list),
        )
        // Cards
        .route("/cards", post(routes::cards::create_card).put(routes::cards::reorder_cards))
        .route(
            "/cards/{card_id}",
            get(routes::cards::get_card)
                .put(routes::cards::update_card)
                .delete(routes::cards::delete_card),
        )
        .route("/cards/{card_id}/move", post(routes::cards::move_card))
        .route(
            "/cards/{card_id}/labels",
            post(routes::labels::attach_label).delete(routes::labels::detach_label),
        )
        .route(
            "/cards/{card_id}/assignees",
            post(routes::assignees::add_assignee).delete(routes::assignees::remove_assignee),
        )
        .route(
            "/cards/{card_id}/comments",
            get(routes::comments::list_comments).post(routes::comments::add_comment),
        )
        // Labels
        .route("/labels", get(routes::labels::list_labels).post(routes::labels::create_label))
        // Members
        .route(
            "/members",
            get(routes::members::list_members)
                .post(routes::members::add_member)
                .delete(routes::members::remove_member),
        )
        // Realtime
        .route(
            "/events",
            get(routes::events::subscribe).post(routes::events::admin_publish),
        );

    let api_routes = Router::new()
        .route("/boards", get(routes::boards::list_boards).post(routes::boards::create_board))
        .nest("/boards/{id}", board_routes)
        .route(
            "/workspaces",
            get(routes::workspaces::list_workspaces).post(routes::workspaces::create_workspace),
        )
        .route(
            "/workspaces/{id}",
            get(routes::workspaces::get_workspace)
                .put(routes::workspaces::rename_workspace)
                .delete(routes::workspaces::delete_workspace),
        )
        .route(
            "/workspaces/{id}/members",
            get(routes::workspaces::list_members).post(routes::workspaces::add_member),
        )
        .route(
            "/workspaces/{id}/members/{member_id}",
            patch(routes::workspaces::update_member).delete(routes::workspaces::remove_member),
        );

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server until `shutdown` resolves.
///
/// Open event streams never finish on their own, so every registered
/// connection is closed once the signal fires to let graceful shutdown
/// complete.
pub async fn run_server<F>(state: AppState, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = state.hub.registry().clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let closed = registry.close_all();
            tracing::info!(closed, "Shutting down, closed event streams");
        })
        .await?;
    Ok(())
}
