//! Image analysis endpoint
//!
//! POST /analyze accepts a multipart form with an `image` file part, stages
//! it to disk, sends it to the analysis provider and answers with the text
//! plus the image echoed back as a data URI.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};

use crate::analysis::{AnalysisError, AnalysisResult};
use crate::error::{AppError, Result, NO_IMAGE_UPLOADED, UPLOAD_READ_FAILED};
use crate::staging::{StagedUpload, StagingArea, StagingError};
use crate::state::AppState;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

const FALLBACK_MIME: &str = "application/octet-stream";

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// POST /analyze
async fn analyze_image(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>> {
    let multipart = multipart.map_err(|e| {
        tracing::warn!("Rejected non-multipart analyze request: {}", e);
        AppError::Validation(NO_IMAGE_UPLOADED)
    })?;

    let upload = receive_image(state.staging(), multipart)
        .await?
        .ok_or(AppError::Validation(NO_IMAGE_UPLOADED))?;

    tracing::info!(
        stage = "received",
        file_name = %upload.original_name,
        mime_type = %upload.mime_type,
        size = upload.size_bytes,
        "Image upload staged"
    );

    let result = state.dispatcher().analyze(upload).await?;

    tracing::info!(
        stage = "responded",
        chars = result.text.len(),
        "Analysis complete"
    );

    Ok(Json(result))
}

/// Stream the first `image` file part into the staging area.
///
/// Returns `None` when the form has no such part.
async fn receive_image(
    staging: &StagingArea,
    mut multipart: Multipart,
) -> Result<Option<StagedUpload>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::Validation(UPLOAD_READ_FAILED)
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        // Browsers send `filename=""` when no file was chosen
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            tracing::debug!("Skipping '{}' field without a filename", IMAGE_FIELD);
            continue;
        };
        let mime_type = resolve_mime(field.content_type(), &original_name);

        let (file, size_bytes) = staging.stage_stream(field).await.map_err(|e| match e {
            StagingError::Source(source) => {
                tracing::error!("Upload stream failed: {}", source);
                AppError::Validation(UPLOAD_READ_FAILED)
            }
            other => AppError::Analysis(AnalysisError::Staging(other)),
        })?;

        return Ok(Some(StagedUpload {
            file,
            original_name,
            mime_type,
            size_bytes,
        }));
    }

    Ok(None)
}

/// Declared content type, or a guess from the file extension
fn resolve_mime(declared: Option<&str>, file_name: &str) -> String {
    match declared {
        Some(mime) if !mime.is_empty() && mime != FALLBACK_MIME => mime.to_string(),
        _ => mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}
