//! Conversion between relay prompts and the Gemini wire format

pub mod request_converter;
pub mod response_converter;
