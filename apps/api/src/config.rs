use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::analysis::ValidationPolicy;
use crate::llm_client::DEFAULT_GEMINI_BASE_URL;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Transport timeout for a single call to the model provider.
    pub request_timeout: Duration,
    /// Caps how long a run may stay Running before it is failed.
    pub analysis_timeout: Option<Duration>,
    /// Language the model writes its free text in.
    pub response_language: String,
    pub validation_policy: ValidationPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let analysis_timeout = match lookup("ANALYSIS_TIMEOUT_MS") {
            Some(raw) => Some(Duration::from_millis(
                raw.parse::<u64>()
                    .context("ANALYSIS_TIMEOUT_MS must be a number of milliseconds")?,
            )),
            None => None,
        };

        Ok(Config {
            gemini_api_key: require("GEMINI_API_KEY")?,
            gemini_base_url: or_default("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            port: or_default("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
            request_timeout: Duration::from_millis(
                or_default("REQUEST_TIMEOUT_MS", "120000")
                    .parse::<u64>()
                    .context("REQUEST_TIMEOUT_MS must be a number of milliseconds")?,
            ),
            analysis_timeout,
            response_language: or_default("RESPONSE_LANGUAGE", "Spanish"),
            validation_policy: or_default("VALIDATION_POLICY", "strict")
                .parse::<ValidationPolicy>()
                .map_err(|e| anyhow!("VALIDATION_POLICY: {e}"))?,
        })
    }
}
