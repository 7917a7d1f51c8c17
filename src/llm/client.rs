use crate::error::{FactsheetError, Result};
use crate::llm::types::*;
use log::debug;
use reqwest::Client;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Handle to the hosted Gemini API, built once from an explicit credential.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a single-turn prompt and returns the model's text verbatim.
    pub async fn generate_text(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: Some(GenerationConfig {
                response_mime_type: "text/plain".to_string(),
            }),
        };

        debug!("Requesting generateContent from model {}", model);
        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FactsheetError::ServiceError(e.to_string()))?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res
                .text()
                .await
                .map_err(|e| FactsheetError::ServiceError(e.to_string()))?;
            return Err(FactsheetError::ServiceError(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res
            .json()
            .await
            .map_err(|e| FactsheetError::ServiceError(e.to_string()))?;
        body.first_text().ok_or_else(|| {
            FactsheetError::ServiceError("No candidates returned".to_string())
        })
    }
}
