pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /generate-summary        keywords -> up to three scenes (POST)
/// /generate-images         photo + one scene -> illustration URL (POST)
/// /stories                 photo + keywords or scenes -> story (POST)
/// /stories/sample          built-in sample story (GET)
/// /composite               framed photo preview (POST, multipart)
/// /overlay                 illustration overlay (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/generate-summary",
            post(handlers::generation::generate_summary),
        )
        .route(
            "/generate-images",
            post(handlers::generation::generate_image),
        )
        .route("/stories", post(handlers::stories::create_story))
        .route("/stories/sample", get(handlers::stories::get_sample_story))
        .route("/composite", post(handlers::compositing::create_composite))
        .route("/overlay", post(handlers::compositing::create_overlay))
}
