use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::traits::GenerationClient;
use super::types::{GenerateRequest, GenerateResponse, GenerationError, ResponsePayload};
use crate::session::Turn;

/// Generation client talking JSON over HTTP to the configured endpoint
pub struct HttpGenerationClient {
    client: Client,
    endpoint: String,
}

impl HttpGenerationClient {
    /// Create a client posting to `endpoint`, giving up after `timeout`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Where requests go
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, history: &[Turn]) -> Result<ResponsePayload, GenerationError> {
        debug!("POST {} with {} turns", self.endpoint, history.len());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest { history })
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status(status.to_string()));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        ResponsePayload::try_from(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ImageRef;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpGenerationClient {
        HttpGenerationClient::new(
            format!("{}/api/generate", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_posts_history_and_parses_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "history": [{"role": "user", "parts": [{"text": "hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text_response": "hi"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let payload = client.generate(&[Turn::user("hello")]).await;
        assert_eq!(payload, Ok(ResponsePayload::Text("hi".to_string())));
    }

    #[tokio::test]
    async fn test_parses_inline_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"text_response": "a cat", "image_base64": "AQID"})),
            )
            .mount(&server)
            .await;

        let payload = client_for(&server).generate(&[Turn::user("cat")]).await;
        assert_eq!(
            payload,
            Ok(ResponsePayload::Both(
                "a cat".to_string(),
                ImageRef::Inline(vec![1, 2, 3])
            ))
        );
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate(&[Turn::user("x")])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Status("500 Internal Server Error".to_string())
        );
        assert_eq!(err.to_string(), "Server error: 500 Internal Server Error");
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate(&[Turn::user("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Grab a free port, then release it so nothing is listening there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HttpGenerationClient::new(
            format!("http://127.0.0.1:{}/api/generate", port),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.generate(&[Turn::user("x")]).await.unwrap_err();
        assert!(matches!(err, GenerationError::Network(_)));
    }
}
