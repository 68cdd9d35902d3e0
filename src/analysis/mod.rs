//! Analysis Module
//!
//! Sends plant images to a remote multimodal model and returns its prose.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use verdant_server::analysis::{AnalysisDispatcher, GeminiProvider};
//!
//! let provider = GeminiProvider::new(&config.gemini)?;
//! let dispatcher = AnalysisDispatcher::new(Arc::new(provider));
//!
//! // Staging file is removed before this returns
//! let result = dispatcher.analyze(staged_upload).await?;
//! ```

mod provider;
mod service;
mod types;

pub use provider::{AnalysisProvider, GeminiProvider};
pub use service::AnalysisDispatcher;
pub use types::{AnalysisError, AnalysisResult, InlinePayload, ANALYSIS_PROMPT};

#[cfg(test)]
pub use provider::MockProvider;
