use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_COMPLETION_API_URL;

/// Application configuration loaded from environment variables.
/// Fails at startup if the completion credential is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub completion_api_url: String,
    pub completion_api_key: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            completion_api_url: std::env::var("COMPLETION_API_URL")
                .unwrap_or_else(|_| DEFAULT_COMPLETION_API_URL.to_string()),
            completion_api_key: require_env("COMPLETION_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}
