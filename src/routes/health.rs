//! Liveness endpoints

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct TestResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
}

/// GET /test
pub async fn test_route() -> Json<TestResponse> {
    tracing::debug!("Test route hit");
    Json(TestResponse {
        message: "Backend is working",
    })
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "verdant-server",
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/test", get(test_route))
        .route("/health", get(health_check))
}
