//! API data models
//!
//! This module contains data structures for the relay's own HTTP API and for
//! the Gemini provider API.

pub mod gemini;
pub mod relay;
