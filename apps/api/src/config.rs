use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_API_URL;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SESSION_TTL_MINUTES: i64 = 120;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm_api_url: String,
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    /// Edit sessions older than this are dropped when a new one is created.
    pub session_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: match std::env::var("MAX_UPLOAD_BYTES") {
                Ok(raw) => raw
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
            },
            session_ttl_minutes: match std::env::var("SESSION_TTL_MINUTES") {
                Ok(raw) => raw
                    .parse::<i64>()
                    .context("SESSION_TTL_MINUTES must be a whole number of minutes")?,
                Err(_) => DEFAULT_SESSION_TTL_MINUTES,
            },
        })
    }

    /// Configuration for router tests: no key, local defaults.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: String::new(),
            llm_api_url: DEFAULT_API_URL.to_string(),
            port: 0,
            rust_log: "info".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
