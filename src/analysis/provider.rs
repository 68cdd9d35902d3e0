//! Analysis Providers
//!
//! Defines the provider trait and the Gemini implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{AnalysisError, InlinePayload};
use crate::config::GeminiConfig;

/// Remote multimodal model that turns an image plus an instruction into text
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Run the instruction against the inline image and return the text
    async fn analyze(&self, prompt: &str, image: &InlinePayload) -> Result<String, AnalysisError>;
}

/// Google Gemini `generateContent` provider
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig) -> Result<Self, AnalysisError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AnalysisError::ApiError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn analyze(&self, prompt: &str, image: &InlinePayload) -> Result<String, AnalysisError> {
        if self.api_key.is_empty() {
            return Err(AnalysisError::ProviderNotConfigured(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }

        let request = GenerateContentRequest::new(prompt, image);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("Failed to call Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::ApiError(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("Failed to parse response: {}", e)))?;

        extract_text(parsed)
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart<'a> {
    Text(&'a str),
    InlineData(InlineData<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, image: &'a InlinePayload) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text(prompt),
                    RequestPart::InlineData(InlineData {
                        mime_type: &image.mime_type,
                        data: &image.data,
                    }),
                ],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Pull the generated text out of the first candidate
fn extract_text(response: GenerateContentResponse) -> Result<String, AnalysisError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AnalysisError::ContentBlocked(format!("Prompt blocked: {}", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(AnalysisError::EmptyResponse)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if matches!(
            reason,
            "SAFETY" | "RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII"
        ) {
            return Err(AnalysisError::ContentBlocked(format!(
                "Response blocked: {}",
                reason
            )));
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    Ok(text)
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    pub response: Result<String, String>,
    pub calls: std::sync::Mutex<Vec<InlinePayload>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl AnalysisProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(&self, _prompt: &str, image: &InlinePayload) -> Result<String, AnalysisError> {
        self.calls.lock().unwrap().push(image.clone());
        self.response.clone().map_err(AnalysisError::ApiError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_request_wire_format() {
        let image = InlinePayload {
            mime_type: "image/png".to_string(),
            data: "iVBORw0KGgo=".to_string(),
        };
        let request = GenerateContentRequest::new("describe", &image);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "describe");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["data"],
            "iVBORw0KGgo="
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Species: Monstera. "}, {"text": "Health: good."}]},
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(
            extract_text(response).unwrap(),
            "Species: Monstera. Health: good."
        );
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let response = parse(serde_json::json!({
            "candidates": [],
            "promptFeedback": {"blockReason": "SAFETY"}
        }));
        assert!(matches!(
            extract_text(response),
            Err(AnalysisError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_extract_text_safety_finish() {
        let response = parse(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }));
        assert!(matches!(
            extract_text(response),
            Err(AnalysisError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let response = parse(serde_json::json!({}));
        assert!(matches!(
            extract_text(response),
            Err(AnalysisError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_gemini_without_key_is_not_configured() {
        let config = crate::config::Config::default().gemini;
        let provider = GeminiProvider::new(&config).unwrap();
        let image = InlinePayload {
            mime_type: "image/png".to_string(),
            data: String::new(),
        };

        let result = provider.analyze("prompt", &image).await;
        assert!(matches!(
            result,
            Err(AnalysisError::ProviderNotConfigured(_))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let mut config = crate::config::Config::default().gemini;
        config.base_url = "http://localhost:8080/".to_string();
        let provider = GeminiProvider::new(&config).unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
