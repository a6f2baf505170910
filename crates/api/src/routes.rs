use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                           job notifications WebSocket (auth via token)
///
/// /generations/music            submit music generation (POST)
/// /generations/video            submit video generation (POST)
/// /generations                  list own jobs (?kind, status, page, limit)
/// /generations/{id}             get, delete
/// /generations/{id}/favorite    toggle favorite (POST)
/// /generations/{id}/public      toggle public visibility (POST)
///
/// /public/generations           public explore listing (no auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoint for job notifications.
        .route("/ws", get(ws::ws_handler))
        // Generation submission.
        .route("/generations/music", post(generation::submit_music))
        .route("/generations/video", post(generation::submit_video))
        // History and per-job operations.
        .route("/generations", get(generation::list_generations))
        .route(
            "/generations/{id}",
            get(generation::get_generation).delete(generation::delete_generation),
        )
        .route(
            "/generations/{id}/favorite",
            post(generation::toggle_favorite),
        )
        .route("/generations/{id}/public", post(generation::toggle_public))
        // Public explore listing.
        .route(
            "/public/generations",
            get(generation::list_public_generations),
        )
}
