//! Gemini provider implementation
//!
//! Calls the Generative Language API `generateContent` method with an API
//! key, as the official SDK does.

use crate::conversion::request_converter::convert_prompt_to_gemini;
use crate::conversion::response_converter::convert_gemini_to_text;
use crate::core::constants::gemini;
use crate::core::provider::{Provider, ProviderError};
use crate::models::gemini::{GeminiErrorEnvelope, GeminiResponse};
use crate::models::relay::ProviderResponse;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Provider for Google's Gemini models
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: u64,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - Generative Language API key
    /// * `base_url` - API root, without the version segment
    /// * `timeout` - Request timeout in seconds
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Unexpected` if the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: String, timeout: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| ProviderError::Unexpected(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Get the endpoint URL for the model
    fn get_endpoint_url(&self, model: &str) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url,
            gemini::API_VERSION,
            model
        )
    }

    /// Pull the human-readable message out of an error body
    fn extract_error_message(body: &str) -> String {
        match serde_json::from_str::<GeminiErrorEnvelope>(body) {
            Ok(envelope) if !envelope.error.message.is_empty() => match envelope.error.status {
                Some(status) => format!("{} ({})", envelope.error.message, status),
                None => envelope.error.message,
            },
            _ if body.trim().is_empty() => "Unknown error".to_string(),
            _ => body.trim().to_string(),
        }
    }

    /// Classify Gemini errors
    fn classify_error(error_detail: &str) -> String {
        let error_lower = error_detail.to_lowercase();

        if error_lower.contains("api key not valid")
            || error_lower.contains("api_key_invalid")
            || error_lower.contains("unauthenticated")
        {
            return "Invalid API key. Please check your GEMINI_API_KEY configuration.".to_string();
        }

        if error_lower.contains("quota") || error_lower.contains("resource_exhausted") {
            return "Rate limit or quota exceeded. Please check your Gemini API quota.".to_string();
        }

        if error_lower.contains("location is not supported")
            || error_lower.contains("failed_precondition")
        {
            return "Gemini API is not available in your region.".to_string();
        }

        if error_lower.contains("not found") && error_lower.contains("model") {
            return "Model not found. Please check your GEMINI_MODEL configuration.".to_string();
        }

        if error_lower.contains("permission") {
            return "Permission denied. Please check that the API key may call this model."
                .to_string();
        }

        error_detail.to_string()
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Unexpected(error.to_string())
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(
        &self,
        model_id: &str,
        user_message: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let url = self.get_endpoint_url(model_id);
        let request = convert_prompt_to_gemini(user_message);

        debug!("Sending generateContent request: model={}", model_id);

        let response = self
            .client
            .post(&url)
            .header(gemini::API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let classified_error = Self::classify_error(&Self::extract_error_message(&error_text));

            let status = status.as_u16();
            return Err(match status {
                401 | 403 => ProviderError::Authentication {
                    status,
                    message: classified_error,
                },
                429 => ProviderError::RateLimit(classified_error),
                400 | 404 => ProviderError::BadRequest {
                    status,
                    message: classified_error,
                },
                _ => ProviderError::ApiError {
                    status,
                    message: classified_error,
                },
            });
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout)
            } else {
                ProviderError::Unexpected(format!("Failed to parse response: {}", e))
            }
        })?;

        Ok(convert_gemini_to_text(&gemini_response))
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-test";
    const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

    fn provider_for(server: &MockServer, timeout: u64) -> GeminiProvider {
        GeminiProvider::new("AIzaTestKey".to_string(), server.uri(), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_single_user_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "AIzaTestKey"))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Give me advice"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": " Budget wisely. "}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, 5);
        let response = provider.generate(MODEL, "Give me advice").await.unwrap();
        assert_eq!(response.text, " Budget wisely. ");
    }

    #[tokio::test]
    async fn test_generate_empty_candidates_is_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let response = provider_for(&server, 5).generate(MODEL, "hi").await.unwrap();
        assert_eq!(response.text, "");
    }

    #[tokio::test]
    async fn test_generate_invalid_key_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "API key not valid. Please pass a valid API key.", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server, 5).generate(MODEL, "hi").await.unwrap_err();
        match err {
            ProviderError::Authentication { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("GEMINI_API_KEY"));
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_unknown_model_keeps_404_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "models/gemini-test is not found", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server, 5).generate(MODEL, "hi").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        match err {
            ProviderError::BadRequest { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("GEMINI_MODEL"));
            }
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server, 5).generate(MODEL, "hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimit(_)));
    }

    #[tokio::test]
    async fn test_generate_server_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = provider_for(&server, 5).generate(MODEL, "hi").await.unwrap_err();
        match err {
            ProviderError::ApiError { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_malformed_body_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider_for(&server, 5).generate(MODEL, "hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_generate_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"candidates": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server, 1).generate(MODEL, "hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(1)));
    }

    #[test]
    fn test_endpoint_url() {
        let provider = GeminiProvider::new(
            "k".to_string(),
            "https://generativelanguage.googleapis.com/".to_string(),
            5,
        )
        .unwrap();
        assert_eq!(
            provider.get_endpoint_url("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_extract_error_message_falls_back_to_body() {
        assert_eq!(GeminiProvider::extract_error_message("plain failure"), "plain failure");
        assert_eq!(GeminiProvider::extract_error_message(""), "Unknown error");
        assert_eq!(
            GeminiProvider::extract_error_message(r#"{"error":{"message":"bad","status":"INVALID_ARGUMENT"}}"#),
            "bad (INVALID_ARGUMENT)"
        );
    }
}
