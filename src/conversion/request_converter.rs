//! Prompt to Gemini request conversion
//!
//! The relay forwards the caller's prompt unmodified as a single user turn.

use crate::core::constants::role;
use crate::models::gemini::{GeminiContent, GeminiPart, GeminiRequest};

/// Build a single-turn `generateContent` request attributing `user_message`
/// to the user role
pub fn convert_prompt_to_gemini(user_message: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some(role::USER.to_string()),
            parts: vec![GeminiPart {
                text: Some(user_message.to_string()),
            }],
        }],
    }
}
