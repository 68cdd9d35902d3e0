//! Report Composer
//!
//! Renders analysis text (and optionally the analyzed image) into a PDF in
//! the reports directory and hands it back as a streamable download.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::data_uri::DataUri;
use super::layout::{self, ReportContent};
use super::pdf::{self, EmbeddedImage};
use super::ReportError;
use crate::staging::ScopedFile;

pub const REPORT_TITLE: &str = "Plant Analysis Report";
const FILE_PREFIX: &str = "plant_analysis_report";

/// A finished report waiting on disk for delivery
#[derive(Debug)]
pub struct GeneratedReport {
    pub file: ScopedFile,
    /// Name offered to the client in `Content-Disposition`
    pub filename: String,
    pub size_bytes: u64,
}

impl GeneratedReport {
    /// Open the report for streaming.
    ///
    /// The returned stream owns the file guard, so the report is deleted once
    /// the stream is exhausted or dropped (e.g. the client disconnects).
    pub async fn into_stream(
        self,
    ) -> Result<impl Stream<Item = std::io::Result<Bytes>> + Send + 'static, ReportError> {
        let handle = tokio::fs::File::open(self.file.path())
            .await
            .map_err(ReportError::Delivery)?;

        let GeneratedReport { file, filename, .. } = self;
        let stream = ReaderStream::new(handle).map(move |chunk| {
            let owned = &file;
            if let Err(e) = &chunk {
                tracing::error!(
                    path = %owned.path().display(),
                    file_name = %filename,
                    error = %e,
                    "Report transfer failed"
                );
            }
            chunk
        });

        Ok(stream)
    }
}

/// Writes PDF reports into a dedicated directory
#[derive(Debug, Clone)]
pub struct ReportComposer {
    reports_dir: PathBuf,
}

impl ReportComposer {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Render `text` and the optional image to a new PDF file.
    ///
    /// The file is flushed and synced before this returns.
    pub async fn compose(
        &self,
        text: &str,
        image: Option<DataUri>,
    ) -> Result<GeneratedReport, ReportError> {
        tokio::fs::create_dir_all(&self.reports_dir)
            .await
            .map_err(ReportError::Directory)?;

        let now = chrono::Local::now();
        let stamp = now.timestamp_millis();
        let filename = format!("{}_{}.pdf", FILE_PREFIX, stamp);
        let file = ScopedFile::new(self.reports_dir.join(format!(
            "{}_{}_{}.pdf",
            FILE_PREFIX,
            stamp,
            Uuid::new_v4().simple()
        )));

        let content = ReportContent {
            title: REPORT_TITLE.to_string(),
            date_line: format!("Date: {}", now.format("%-m/%-d/%Y")),
            body: text.to_string(),
            image_size: None,
        };

        let bytes = tokio::task::spawn_blocking(move || render_report(content, image))
            .await
            .map_err(|e| ReportError::Render(format!("Render task failed: {}", e)))??;

        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(file.path())
            .await?;
        out.write_all(&bytes).await?;
        out.flush().await?;
        out.sync_all().await?;

        tracing::info!(
            stage = "rendered",
            file_name = %filename,
            size = bytes.len(),
            "Report written"
        );

        Ok(GeneratedReport {
            file,
            filename,
            size_bytes: bytes.len() as u64,
        })
    }
}

fn render_report(mut content: ReportContent, image: Option<DataUri>) -> Result<Vec<u8>, ReportError> {
    let embedded = image
        .map(|uri| EmbeddedImage::decode(&uri.bytes))
        .transpose()?;
    content.image_size = embedded.as_ref().map(|img| (img.width, img.height));

    let layout = layout::layout(&content);
    pdf::render(&layout, &content.title, embedded)
}
