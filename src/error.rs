//! Error types for the Verdant server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::report::{DataUriError, ReportError};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

pub const NO_IMAGE_UPLOADED: &str = "No image file uploaded";
pub const UPLOAD_READ_FAILED: &str = "Failed to read uploaded image";
pub const ANALYSIS_FAILED: &str = "An error occurred while analyzing the image";
pub const INVALID_REPORT_REQUEST: &str = "Invalid report request";
pub const REPORT_REQUEST_TOO_LARGE: &str = "Report request is too large";
pub const NO_RESULT_PROVIDED: &str = "No analysis result provided";
pub const INVALID_IMAGE_DATA: &str = "Invalid image data";
pub const REPORT_FAILED: &str = "An error occurred while generating the PDF report";
pub const DOWNLOAD_FAILED: &str = "Error downloading the PDF report";

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(&'static str),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(&'static str),

    #[error("Invalid image data URI: {0}")]
    InvalidImage(#[from] DataUriError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, *msg)
            }
            AppError::PayloadTooLarge(msg) => {
                tracing::warn!("Rejected oversized request: {}", msg);
                (StatusCode::PAYLOAD_TOO_LARGE, *msg)
            }
            AppError::InvalidImage(e) => {
                tracing::warn!("Rejected report image: {}", e);
                (StatusCode::BAD_REQUEST, INVALID_IMAGE_DATA)
            }
            AppError::Analysis(e) => {
                tracing::error!("Error analyzing image: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, ANALYSIS_FAILED)
            }
            AppError::Report(ReportError::Delivery(e)) => {
                tracing::error!("Error downloading PDF report: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, DOWNLOAD_FAILED)
            }
            AppError::Report(e) => {
                tracing::error!("Error generating PDF report: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, REPORT_FAILED)
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
