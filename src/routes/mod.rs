//! Route modules for Verdant Server

pub mod analyze;
pub mod download;
pub mod health;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router
///
/// API routes first; everything else falls through to the public directory.
pub fn router(state: AppState) -> Router {
    let public_dir = state.config().storage.public_dir.clone();
    let max_upload_bytes = state.config().server.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::router())
        .merge(analyze::router(max_upload_bytes))
        .merge(download::router(max_upload_bytes))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
