//! PDF report endpoint
//!
//! POST /download takes `{ result, image }` and streams back a freshly
//! rendered "Plant Analysis Report". The file on disk lives only as long as
//! the response body.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{
    AppError, Result, INVALID_REPORT_REQUEST, NO_RESULT_PROVIDED, REPORT_REQUEST_TOO_LARGE,
};
use crate::report::{DataUri, ReportError};
use crate::state::AppState;

/// Room for the JSON envelope and the analysis text around the image
const REQUEST_HEADROOM_BYTES: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Largest `/download` body accepted for a given upload limit.
///
/// The image comes back inline as base64, so any upload `/analyze` accepted
/// must fit here after the 4/3 expansion.
pub fn report_body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(REQUEST_HEADROOM_BYTES)
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/download", post(download_report))
        .layer(DefaultBodyLimit::max(report_body_limit(max_upload_bytes)))
}

/// POST /download
async fn download_report(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| {
        tracing::warn!("Rejected report request body: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(REPORT_REQUEST_TOO_LARGE)
        } else {
            AppError::Validation(INVALID_REPORT_REQUEST)
        }
    })?;

    // Present but empty is fine; the report just has no body text
    let text = request
        .result
        .ok_or(AppError::Validation(NO_RESULT_PROVIDED))?;

    let image = match request.image.as_deref() {
        Some(uri) if !uri.is_empty() => Some(DataUri::parse(uri)?),
        _ => None,
    };

    tracing::info!(
        stage = "received",
        chars = text.len(),
        has_image = image.is_some(),
        "Report requested"
    );

    let report = state.reports().compose(&text, image).await?;
    let filename = report.filename.clone();
    let size_bytes = report.size_bytes;
    let stream = report.into_stream().await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_LENGTH, size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ReportError::Delivery(std::io::Error::other(e)))?;

    tracing::info!(
        stage = "responded",
        file_name = %filename,
        size = size_bytes,
        "Streaming report"
    );

    Ok(response)
}
