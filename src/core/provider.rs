//! Provider abstraction layer
//!
//! The relay talks to the generative-language API only through [`Provider`],
//! so handlers can be exercised against stub implementations.

use crate::models::relay::ProviderResponse;
use async_trait::async_trait;
use thiserror::Error;

/// Error types for provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Authentication failed (status {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Bad request (status {status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Provider did not answer within {0}s")]
    Timeout(u64),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ProviderError {
    /// Upstream HTTP status, when the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Authentication { status, .. }
            | ProviderError::BadRequest { status, .. }
            | ProviderError::ApiError { status, .. } => Some(*status),
            ProviderError::RateLimit(_) => Some(429),
            ProviderError::Timeout(_) | ProviderError::Unexpected(_) => None,
        }
    }
}

/// Trait for generative-language providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send `user_message` as a single user turn to `model_id`
    ///
    /// One attempt per call; no retries and no caching.
    async fn generate(
        &self,
        model_id: &str,
        user_message: &str,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}
