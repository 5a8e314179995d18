//! Core application modules
//!
//! This module contains configuration, constants, logging, and the provider
//! abstraction with its Gemini implementation.

pub mod config;
pub mod constants;
pub mod logging;
pub mod provider;
pub mod providers;
