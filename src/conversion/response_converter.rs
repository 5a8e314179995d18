//! Gemini response normalization and endpoint post-processing
//!
//! This module turns a `generateContent` response into a
//! [`ProviderResponse`] and applies the per-endpoint cleanup rules before the
//! text is handed back to the client.

use crate::models::gemini::GeminiResponse;
use crate::models::relay::ProviderResponse;
use tracing::{debug, warn};

/// Convert a Gemini response into the relay's normalized form
///
/// The text is the concatenation of every text part of the first candidate.
/// A response without candidates or text parts yields an empty string.
pub fn convert_gemini_to_text(response: &GeminiResponse) -> ProviderResponse {
    if let Some(usage) = &response.usage_metadata {
        debug!(
            "Gemini usage: prompt={}, candidates={}, total={}",
            usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
        );
    }

    let Some(candidate) = response.candidates.first() else {
        let reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
            .unwrap_or("none given");
        warn!("Gemini returned no candidates (block reason: {})", reason);
        return ProviderResponse::default();
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.is_empty() {
        warn!(
            "Gemini candidate carried no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        );
    }

    ProviderResponse::new(text)
}

/// Post-processing for the analyze endpoint
pub fn clean_advice(text: &str) -> String {
    text.trim().to_string()
}

/// Post-processing for the quote endpoint
///
/// Trims whitespace, then removes one leading and one trailing `"`. The two
/// ends are checked independently, so a lone opening quote is dropped too.
pub fn clean_quote(text: &str) -> String {
    let trimmed = text.trim();
    let without_leading = trimmed.strip_prefix('"').unwrap_or(trimmed);
    without_leading
        .strip_suffix('"')
        .unwrap_or(without_leading)
        .to_string()
}
