use crate::error::{FactsheetError, Result};
use crate::llm::client::GeminiClient;
use crate::llm::prompts::EXPLANATION_PROMPT;
use crate::schema::{DEFAULT_EXPLANATION_MODEL, DEFAULT_EXPLANATION_TIMEOUT_SECS};
use log::info;
use std::time::Duration;

/// Asks the model for a plain-language walkthrough of the factsheet.
///
/// The prompt is static: it enumerates the factsheet sections and never
/// includes the uploaded numbers, so the answer is generic to the layout.
pub struct Explainer {
    client: GeminiClient,
    model: String,
    timeout: Duration,
}

impl Explainer {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_EXPLANATION_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_EXPLANATION_TIMEOUT_SECS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn prompt(&self) -> &'static str {
        EXPLANATION_PROMPT
    }

    /// Sends the prompt once. Transport, HTTP and timeout failures all
    /// surface as [`FactsheetError::ServiceError`]; there is no retry.
    pub async fn explain(&self) -> Result<String> {
        info!("Requesting factsheet explanation from {}", self.model);
        match tokio::time::timeout(
            self.timeout,
            self.client.generate_text(&self.model, EXPLANATION_PROMPT),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FactsheetError::ServiceError(format!(
                "No response from {} within {:?}",
                self.model, self.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_prompt_lists_sections_only() {
        let explainer = Explainer::new(GeminiClient::new("key"));
        let prompt = explainer.prompt();
        for topic in [
            "investment growth",
            "Information Ratio",
            "Regional and sector",
            "Yearly performance",
            "disclosures",
        ] {
            assert!(prompt.contains(topic), "prompt is missing {topic}");
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_service_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GeminiClient::new("key").with_base_url(format!("http://{}", addr));
        let err = Explainer::new(client)
            .with_timeout(Duration::from_secs(5))
            .explain()
            .await
            .unwrap_err();
        assert!(matches!(err, FactsheetError::ServiceError(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_service_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let body = r#"{"error":{"code":403,"message":"API key not valid"}}"#;
            let response = format!(
                "HTTP/1.1 403 Forbidden\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });

        let client = GeminiClient::new("bad-key").with_base_url(format!("http://{}", addr));
        match Explainer::new(client).explain().await {
            Err(FactsheetError::ServiceError(message)) => assert!(message.contains("403")),
            other => panic!("expected ServiceError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_returns_model_text_verbatim() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"The fund grew steadily."}]}}]}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });

        let client = GeminiClient::new("key").with_base_url(format!("http://{}/", addr));
        let text = Explainer::new(client).explain().await.unwrap();
        assert_eq!(text, "The fund grew steadily.");
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = GeminiClient::new("key").with_base_url(format!("http://{}", addr));
        let err = Explainer::new(client)
            .with_timeout(Duration::from_millis(200))
            .explain()
            .await
            .unwrap_err();
        match err {
            FactsheetError::ServiceError(message) => assert!(message.contains("within")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
