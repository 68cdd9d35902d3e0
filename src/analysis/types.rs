//! Analysis Types

use serde::Serialize;

use crate::staging::StagingError;

/// Instruction sent with every image
pub const ANALYSIS_PROMPT: &str = "Analyze this plant image and provide detailed analysis of its species, health, and care recommendations, its characteristics, care instructions, and any interesting facts. Please provide the response in plain text without using any markdown formatting.";

/// Binary attachment passed to the provider alongside the instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePayload {
    pub mime_type: String,
    /// Standard base64 of the image bytes
    pub data: String,
}

impl InlinePayload {
    /// Render as `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Analysis returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    #[serde(rename = "result")]
    pub text: String,
    #[serde(rename = "image")]
    pub image_data_uri: String,
}

/// Analysis error types
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Failed to stage upload: {0}")]
    Staging(#[from] StagingError),

    #[error("Failed to read staged image: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Analysis provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Content blocked: {0}")]
    ContentBlocked(String),

    #[error("Provider returned no text")]
    EmptyResponse,
}
