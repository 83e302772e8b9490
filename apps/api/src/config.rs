use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::matching::validation::InputLimits;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Only the commands that talk to the model require it; see `require_api_key`.
    pub google_api_key: Option<String>,
    pub llm_model: String,
    pub gemini_endpoint: String,
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub limits: InputLimits,
    pub max_retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = InputLimits::default();

        Ok(Config {
            google_api_key: std::env::var("GOOGLE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            llm_model: env_or("LLM_MODEL", DEFAULT_MODEL),
            gemini_endpoint: env_or("GEMINI_ENDPOINT", DEFAULT_ENDPOINT),
            database_url: env_or("DATABASE_URL", "sqlite://resume_matcher.db?mode=rwc"),
            port: parse_env("PORT", 5000)?,
            rust_log: env_or("RUST_LOG", "info"),
            limits: InputLimits {
                max_resume_chars: parse_env("MAX_RESUME_LENGTH", defaults.max_resume_chars)?,
                max_jd_chars: parse_env("MAX_JD_LENGTH", defaults.max_jd_chars)?,
            },
            max_retries: parse_env("MAX_RETRIES", 3)?,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.google_api_key
            .as_deref()
            .context("GOOGLE_API_KEY not set. Set it in the environment or in .env")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
