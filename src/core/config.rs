//! Application configuration management
//!
//! Configuration comes from an optional TOML file, a `.env` file and
//! environment variables, in increasing order of precedence. Everything is
//! resolved and validated once at startup; handlers only ever see the
//! immutable [`Config`].

use crate::core::constants::gemini;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default server port
const DEFAULT_PORT: u16 = 3001;

/// Default outbound request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT: u64 = 60;

/// Default inbound body limit in bytes
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Default config file looked up when `CONFIG_PATH` is not set
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Origins the local frontend dev server is reachable from
const LOCAL_DEV_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

/// How the relay is hosted
///
/// The mode picks the defaults for base path, CORS, missing-key handling and
/// whether provider error details reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Long-running process serving the local frontend under `/api`
    Server,
    /// Single-invocation host mounted at the root with permissive CORS
    Serverless,
}

impl DeploymentMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "server" | "standalone" => Some(DeploymentMode::Server),
            "serverless" | "function" | "vercel" => Some(DeploymentMode::Serverless),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Server => "server",
            DeploymentMode::Serverless => "serverless",
        }
    }

    fn default_base_path(&self) -> &'static str {
        match self {
            DeploymentMode::Server => "/api",
            DeploymentMode::Serverless => "",
        }
    }

    fn default_cors(&self) -> CorsPolicy {
        match self {
            DeploymentMode::Server => {
                CorsPolicy::AllowList(LOCAL_DEV_ORIGINS.iter().map(|o| o.to_string()).collect())
            }
            DeploymentMode::Serverless => CorsPolicy::Wildcard,
        }
    }

    fn default_expose_error_details(&self) -> bool {
        matches!(self, DeploymentMode::Serverless)
    }

    /// Whether a missing credential must abort startup
    pub fn missing_key_is_fatal(&self) -> bool {
        matches!(self, DeploymentMode::Server)
    }
}

/// Cross-origin policy applied to every route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin, method and header
    Wildcard,
    /// Only the listed origins, `POST` with a `Content-Type` header
    AllowList(Vec<String>),
}

impl CorsPolicy {
    fn from_origins(origins: Vec<String>) -> Result<Self> {
        if origins.iter().any(|o| o.trim() == "*") {
            return Ok(CorsPolicy::Wildcard);
        }

        let mut list = Vec::with_capacity(origins.len());
        for origin in origins {
            let origin = origin.trim().trim_end_matches('/').to_string();
            if !(origin.starts_with("http://") || origin.starts_with("https://"))
                || origin.contains(char::is_whitespace)
            {
                bail!("Invalid CORS origin '{}': expected scheme://host[:port]", origin);
            }
            list.push(origin);
        }
        Ok(CorsPolicy::AllowList(list))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: gemini::DEFAULT_MODEL.to_string(),
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub base_path: Option<String>,
    pub cors_origins: Option<Vec<String>>,
    pub expose_error_details: Option<bool>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            base_path: None,
            cors_origins: None,
            expose_error_details: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub request_timeout: u64,
    pub max_body_bytes: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Raw file layout, before environment overrides and mode defaults
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    pub mode: Option<String>,
    pub gemini: GeminiConfig,
    pub server: ServerConfig,
    pub request: RequestConfig,
}

impl TomlConfig {
    /// Apply environment overrides; `lookup` stands in for `std::env::var`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(mode) = lookup("DEPLOYMENT_MODE") {
            self.mode = Some(mode);
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value '{}'", port))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.server.log_level = level;
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT") {
            self.request.request_timeout = timeout
                .trim()
                .parse()
                .with_context(|| format!("Invalid REQUEST_TIMEOUT value '{}'", timeout))?;
        }
        if let Some(limit) = lookup("MAX_BODY_BYTES") {
            self.request.max_body_bytes = limit
                .trim()
                .parse()
                .with_context(|| format!("Invalid MAX_BODY_BYTES value '{}'", limit))?;
        }
        Ok(())
    }
}

/// Resolved relay configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Hosting mode
    pub mode: DeploymentMode,

    /// Provider credential; `None` when absent or blank
    pub gemini_api_key: Option<String>,

    /// Model identifier sent with every provider call
    pub gemini_model: String,

    /// Provider API root
    pub gemini_base_url: String,

    pub host: String,
    pub port: u16,
    pub log_level: String,

    /// Prefix for the relay routes, empty or starting with `/`
    pub base_path: String,

    pub cors: CorsPolicy,

    /// Whether 500 bodies carry a `details` field
    pub expose_error_details: bool,

    /// Outbound request timeout in seconds
    pub request_timeout: u64,

    /// Largest accepted request body; bigger bodies get 413
    pub max_body_bytes: usize,
}

impl Config {
    /// Resolve a raw file layout into the final configuration
    ///
    /// # Errors
    ///
    /// Returns error if the mode, CORS origins or timeout are invalid.
    pub fn resolve(raw: TomlConfig) -> Result<Self> {
        let mode = match raw.mode.as_deref() {
            None => DeploymentMode::Server,
            Some(s) => DeploymentMode::from_str(s)
                .with_context(|| format!("Invalid mode '{}'. Must be one of: server, serverless", s))?,
        };

        if raw.request.request_timeout == 0 {
            bail!("request_timeout must be greater than zero");
        }

        if raw.request.max_body_bytes == 0 {
            bail!("max_body_bytes must be greater than zero");
        }

        let cors = match raw.server.cors_origins {
            Some(origins) => CorsPolicy::from_origins(origins)?,
            None => mode.default_cors(),
        };

        let base_path = normalize_base_path(
            raw.server
                .base_path
                .as_deref()
                .unwrap_or_else(|| mode.default_base_path()),
        );

        let gemini_api_key = raw
            .gemini
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(Config {
            mode,
            gemini_api_key,
            gemini_model: raw.gemini.model,
            gemini_base_url: raw.gemini.base_url.trim_end_matches('/').to_string(),
            host: raw.server.host,
            port: raw.server.port,
            log_level: raw.server.log_level,
            base_path,
            cors,
            expose_error_details: raw
                .server
                .expose_error_details
                .unwrap_or_else(|| mode.default_expose_error_details()),
            request_timeout: raw.request.request_timeout,
            max_body_bytes: raw.request.max_body_bytes,
        })
    }

    /// Parse configuration from TOML text without environment overrides
    #[cfg(test)]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: TomlConfig = toml::from_str(content).context("Failed to parse TOML configuration")?;
        Self::resolve(raw)
    }

    /// Load the optional file at `path`, then apply overrides from `lookup`
    ///
    /// A missing file is only an error when `required` is set.
    pub fn load<F>(path: &Path, required: bool, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut raw: TomlConfig = if path.exists() {
            let content = fs::read_to_string(path).with_context(|| {
                format!("Failed to read configuration file {}", path.display())
            })?;
            toml::from_str(&content).context("Failed to parse TOML configuration")?
        } else if required {
            bail!("Configuration file {} not found", path.display());
        } else {
            TomlConfig::default()
        };

        raw.apply_overrides(lookup)?;
        Self::resolve(raw)
    }

    /// Load configuration from `.env`, `CONFIG_PATH` and the environment
    ///
    /// `config.toml` in the current directory is used when present;
    /// an explicit `CONFIG_PATH` must exist.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let (path, required) = match std::env::var("CONFIG_PATH") {
            Ok(p) => (p, true),
            Err(_) => (DEFAULT_CONFIG_PATH.to_string(), false),
        };

        Self::load(Path::new(&path), required, |key| std::env::var(key).ok())
    }

    /// First characters of the key for startup logs
    pub fn masked_api_key(&self) -> Option<String> {
        self.gemini_api_key
            .as_ref()
            .map(|k| format!("{}...", k.chars().take(4).collect::<String>()))
    }

    /// Full path of a relay route under the configured base path
    pub fn route_path(&self, suffix: &str) -> String {
        format!("{}{}", self.base_path, suffix)
    }
}

fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
