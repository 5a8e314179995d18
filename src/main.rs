//! Budget Advisor Prompt Relay
//!
//! This application accepts prompts from the budgeting frontend, forwards
//! them to the Gemini API and returns the cleaned-up text as JSON.

mod api;
mod conversion;
mod core;
mod models;

use crate::api::endpoints::{AppState, create_router};
use crate::core::config::Config;
use crate::core::logging::init_logging;
use crate::core::provider::Provider;
use crate::core::providers::GeminiProvider;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Check for --help flag
    if std::env::args().any(|arg| arg == "--help") {
        print_help();
        return;
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("Configuration Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config.log_level);

    print_startup_banner(&config);

    // Create provider when a credential is present
    let provider: Option<Arc<dyn Provider>> = match config.gemini_api_key.clone() {
        Some(api_key) => match GeminiProvider::new(
            api_key,
            config.gemini_base_url.clone(),
            config.request_timeout,
        ) {
            Ok(provider) => Some(Arc::new(provider) as Arc<dyn Provider>),
            Err(e) => {
                error!("Failed to initialize provider: {}", e);
                std::process::exit(1);
            }
        },
        None if config.mode.missing_key_is_fatal() => {
            error!("GEMINI_API_KEY is not set; refusing to start in {} mode", config.mode.as_str());
            std::process::exit(1);
        }
        None => {
            warn!("GEMINI_API_KEY is not set; relay endpoints will answer 503");
            None
        }
    };

    if let Some(provider) = &provider {
        info!("Using provider: {} (model {})", provider.provider_name(), config.gemini_model);
    }

    // Create application state
    let app_state = AppState {
        config: config.clone(),
        provider,
    };

    // Create router
    let app = create_router(app_state);

    // Bind to address
    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server listening on http://{}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Print startup banner with configuration
fn print_startup_banner(config: &Config) {
    println!("💰 Budget Advisor Prompt Relay v{}", env!("CARGO_PKG_VERSION"));
    println!("✅ Configuration loaded successfully");
    println!("   Mode: {}", config.mode.as_str());
    println!("   Model: {}", config.gemini_model);
    println!("   Base URL: {}", config.gemini_base_url);
    println!(
        "   API Key: {}",
        config
            .masked_api_key()
            .unwrap_or_else(|| "not configured".to_string())
    );
    println!("   Routes: {}{{/analyze,/quote}}", config.base_path);
    println!("   CORS: {:?}", config.cors);
    println!("   Error Details Exposed: {}", config.expose_error_details);
    println!("   Request Timeout: {}s", config.request_timeout);
    println!("   Max Body Size: {} bytes", config.max_body_bytes);
    println!("   Server: {}:{}", config.host, config.port);
    println!();
}

/// Print help message
fn print_help() {
    println!("Budget Advisor Prompt Relay v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: budget-advisor-relay [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --help    Display this help message");
    println!();
    println!("Configuration is read from CONFIG_PATH (default: ./config.toml, optional),");
    println!("a .env file, and the environment, in increasing order of precedence.");
    println!();
    println!("Environment variables:");
    println!("  GEMINI_API_KEY - Gemini API key (required in server mode)");
    println!("  GEMINI_MODEL - Model identifier (default: gemini-2.5-flash-preview-09-2025)");
    println!("  GEMINI_BASE_URL - API root (default: https://generativelanguage.googleapis.com)");
    println!("  DEPLOYMENT_MODE - server or serverless (default: server)");
    println!("  HOST - Server host (default: 0.0.0.0)");
    println!("  PORT - Server port (default: 3001)");
    println!("  LOG_LEVEL - Logging level (default: info)");
    println!("  REQUEST_TIMEOUT - Provider request timeout in seconds (default: 60)");
    println!("  MAX_BODY_BYTES - Largest accepted request body (default: 10485760)");
    println!();
    println!("Deployment modes:");
    println!("  server     - routes under /api, CORS for the local frontend, missing key is fatal");
    println!("  serverless - routes at the root, CORS for any origin, missing key answers 503");
}
