//! Constants for provider roles, default settings and user-facing messages
//!
//! This module defines string constants used throughout the application for
//! message roles, endpoint paths, defaults and the short error messages
//! returned to callers.

/// Message role constants
pub mod role {
    /// User role identifier
    pub const USER: &str = "user";
}

/// Provider defaults
pub mod gemini {
    /// Model used when none is configured
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";

    /// Public Generative Language API endpoint
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

    /// API version path segment
    pub const API_VERSION: &str = "v1beta";

    /// Header carrying the API key
    pub const API_KEY_HEADER: &str = "x-goog-api-key";
}

/// Relay route suffixes, appended to the deployment base path
pub mod route {
    pub const ANALYZE: &str = "/analyze";
    pub const QUOTE: &str = "/quote";
    pub const HEALTH: &str = "/health";
}

/// Messages returned in `{"error": ...}` bodies
pub mod message {
    pub const PROMPT_MISSING: &str = "Prompt was not provided.";
    pub const PAYLOAD_TOO_LARGE: &str = "Request body is too large.";
    pub const SERVICE_UNAVAILABLE: &str = "AI service is not ready. Please set GEMINI_API_KEY.";
    pub const ANALYZE_FAILED: &str = "AI analysis failed.";
    pub const QUOTE_FAILED: &str = "AI quote generation failed.";
}
