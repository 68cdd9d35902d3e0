//! Application state management

use std::sync::Arc;

use crate::analysis::{AnalysisDispatcher, AnalysisError, AnalysisProvider, GeminiProvider};
use crate::config::Config;
use crate::report::ReportComposer;
use crate::staging::StagingArea;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize analysis provider: {0}")]
    ProviderInit(#[from] AnalysisError),
}

/// Shared application state
///
/// Read-only after construction; requests share nothing mutable through it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    staging: StagingArea,
    dispatcher: AnalysisDispatcher,
    reports: ReportComposer,
}

impl AppState {
    /// Create application state backed by the Gemini provider
    pub fn new(config: Config) -> Result<Self, StateError> {
        let provider = GeminiProvider::new(&config.gemini)?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Create application state with an explicit analysis provider
    pub fn with_provider(config: Config, provider: Arc<dyn AnalysisProvider>) -> Self {
        let staging = StagingArea::new(config.storage.upload_dir.clone());
        let reports = ReportComposer::new(config.storage.reports_dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                staging,
                dispatcher: AnalysisDispatcher::new(provider),
                reports,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the upload staging area
    pub fn staging(&self) -> &StagingArea {
        &self.inner.staging
    }

    /// Get the analysis dispatcher
    pub fn dispatcher(&self) -> &AnalysisDispatcher {
        &self.inner.dispatcher
    }

    /// Get the report composer
    pub fn reports(&self) -> &ReportComposer {
        &self.inner.reports
    }
}
