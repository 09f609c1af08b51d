//! Configuration file parser for ~/.config/newsfeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged, since they are usually typos.
use crate::feed::CoordinatorOptions;
use crate::source::HttpSourceOptions;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `access_token` from the file.
pub const ACCESS_TOKEN_ENV: &str = "NEWSFEED_ACCESS_TOKEN";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A value parsed but is out of range.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// `Debug` masks `access_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the API; `/newsfeed.get` is appended to it.
    pub endpoint: String,

    /// API access token (alternative to the NEWSFEED_ACCESS_TOKEN env var).
    pub access_token: Option<String>,

    /// Span of one page, in days.
    pub window_days: u64,

    /// Timeout for one page request, in seconds.
    pub request_timeout_secs: u64,

    /// Largest accepted response body, in bytes.
    pub max_response_bytes: u64,

    /// Feed notifications that may queue before fetches wait for the display.
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "https://api.vk.com/method".to_string(),
            access_token: None,
            window_days: 30,
            request_timeout_secs: 30,
            max_response_bytes: 10 * 1024 * 1024,
            event_capacity: 32,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("window_days", &self.window_days)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "endpoint",
        "access_token",
        "window_days",
        "request_timeout_secs",
        "max_response_bytes",
        "event_capacity",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::parse(&content)?;
        tracing::info!(path = %path.display(), endpoint = %config.endpoint, "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days == 0 {
            return Err(ConfigError::Invalid("window_days must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_response_bytes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Access token, preferring the environment over the file.
    pub fn access_token(&self) -> Option<SecretString> {
        Self::resolve_token(std::env::var(ACCESS_TOKEN_ENV).ok(), self.access_token.as_deref())
    }

    fn resolve_token(env: Option<String>, file: Option<&str>) -> Option<SecretString> {
        env.filter(|t| !t.trim().is_empty())
            .or_else(|| file.filter(|t| !t.trim().is_empty()).map(str::to_owned))
            .map(SecretString::from)
    }

    pub fn window_span(&self) -> Duration {
        Duration::from_secs(self.window_days.saturating_mul(24 * 60 * 60))
    }

    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            window_span: self.window_span(),
            event_capacity: self.event_capacity,
        }
    }

    pub fn source_options(&self) -> HttpSourceOptions {
        HttpSourceOptions {
            timeout: Duration::from_secs(self.request_timeout_secs),
            max_response_bytes: usize::try_from(self.max_response_bytes).unwrap_or(usize::MAX),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
