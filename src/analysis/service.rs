//! Analysis Dispatcher
//!
//! Turns a staged upload into text by way of the configured provider.

use std::sync::Arc;

use base64::Engine;

use super::{
    provider::AnalysisProvider,
    types::{AnalysisError, AnalysisResult, InlinePayload, ANALYSIS_PROMPT},
};
use crate::staging::StagedUpload;

/// Sends staged images to the analysis provider
#[derive(Clone)]
pub struct AnalysisDispatcher {
    provider: Arc<dyn AnalysisProvider>,
}

impl AnalysisDispatcher {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self { provider }
    }

    /// Analyze a staged upload.
    ///
    /// Consumes the upload; its staging file is removed before this returns,
    /// whether the analysis succeeded or not.
    pub async fn analyze(&self, upload: StagedUpload) -> Result<AnalysisResult, AnalysisError> {
        let StagedUpload {
            file,
            original_name,
            mime_type,
            size_bytes,
        } = upload;

        let bytes = tokio::fs::read(file.path()).await?;
        let payload = InlinePayload {
            mime_type,
            data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        };

        tracing::info!(
            stage = "dispatched",
            provider = %self.provider.name(),
            file_name = %original_name,
            mime_type = %payload.mime_type,
            size = size_bytes,
            "Sending image to analysis provider"
        );

        let outcome = self.provider.analyze(ANALYSIS_PROMPT, &payload).await;
        drop(file);

        let text = outcome?;

        tracing::debug!(
            file_name = %original_name,
            chars = text.len(),
            "Analysis provider responded"
        );

        Ok(AnalysisResult {
            text,
            image_data_uri: payload.to_data_uri(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::provider::MockProvider;
    use crate::staging::StagingArea;
    use tempfile::TempDir;

    async fn stage(area: &StagingArea, bytes: &[u8], mime: &str) -> StagedUpload {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![Ok(bytes.to_vec())];
        let (file, size_bytes) = area.stage_stream(futures::stream::iter(chunks)).await.unwrap();
        StagedUpload {
            file,
            original_name: "leaf.png".to_string(),
            mime_type: mime.to_string(),
            size_bytes,
        }
    }

    #[tokio::test]
    async fn test_analyze_returns_text_and_image() {
        let temp_dir = TempDir::new().unwrap();
        let area = StagingArea::new(temp_dir.path());
        let provider = Arc::new(MockProvider::replying("A thriving basil plant."));
        let dispatcher = AnalysisDispatcher::new(provider.clone());

        let upload = stage(&area, b"\x89PNG fake image", "image/png").await;
        let staged_path = upload.file.path().to_path_buf();

        let result = dispatcher.analyze(upload).await.unwrap();

        assert_eq!(result.text, "A thriving basil plant.");
        let encoded = result
            .image_data_uri
            .strip_prefix("data:image/png;base64,")
            .unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"\x89PNG fake image");
        assert!(!staged_path.exists());

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_analyze_failure_still_removes_staged_file() {
        let temp_dir = TempDir::new().unwrap();
        let area = StagingArea::new(temp_dir.path());
        let dispatcher = AnalysisDispatcher::new(Arc::new(MockProvider::failing("quota exceeded")));

        let upload = stage(&area, b"bytes", "image/jpeg").await;
        let staged_path = upload.file.path().to_path_buf();

        let result = dispatcher.analyze(upload).await;

        assert!(matches!(result, Err(AnalysisError::ApiError(_))));
        assert!(!staged_path.exists());
    }

    #[tokio::test]
    async fn test_analyze_missing_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let area = StagingArea::new(temp_dir.path());
        let provider = Arc::new(MockProvider::replying("unused"));
        let dispatcher = AnalysisDispatcher::new(provider.clone());

        let upload = StagedUpload {
            file: area.reserve(),
            original_name: "ghost.png".to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 0,
        };

        let result = dispatcher.analyze(upload).await;

        assert!(matches!(result, Err(AnalysisError::ReadError(_))));
        assert!(provider.calls.lock().unwrap().is_empty());
    }
}
