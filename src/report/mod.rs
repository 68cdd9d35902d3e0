//! PDF Report Module
//!
//! Turns an analysis into a downloadable "Plant Analysis Report":
//!
//! - `data_uri`: typed parsing of the client-supplied image
//! - `layout`: text wrapping, pagination and image placement
//! - `pdf`: serialization via `lopdf`
//! - `composer`: directory handling, file lifetime and delivery

mod composer;
pub mod data_uri;
pub mod layout;
pub mod pdf;

pub use composer::{GeneratedReport, ReportComposer, REPORT_TITLE};
pub use data_uri::{DataUri, DataUriError};

/// Report generation and delivery errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to create reports directory: {0}")]
    Directory(#[source] std::io::Error),

    #[error("Failed to decode embedded image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to render PDF: {0}")]
    Render(String),

    #[error("Failed to write report: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to open report for download: {0}")]
    Delivery(#[source] std::io::Error),
}
