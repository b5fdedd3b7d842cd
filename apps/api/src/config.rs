use std::time::Duration;

use anyhow::{Context, Result};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "deepseek/deepseek-chat:free";
const DEFAULT_SITE_URL: &str = "http://localhost:5174";
const APP_TITLE: &str = "Portfolio AI Chat";

/// Application configuration loaded from environment variables.
/// Only `PORT` can fail; everything else has a default or is optional.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub resume_path: String,
    pub frontend_url: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub ai_model: String,
    pub site_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: env_or("DATABASE_URL", "sqlite://portfolio.db"),
            resume_path: env_or("RESUME_PATH", "resume_data.json"),
            frontend_url: optional_env("FRONTEND_URL"),
            openrouter_api_key: optional_env("OPENROUTER_API_KEY"),
            ai_model: env_or("AI_MODEL", DEFAULT_MODEL),
            site_url: env_or("SITE_URL", DEFAULT_SITE_URL),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Derives the provider settings handed to the chat orchestrator and the upstream client.
    pub fn provider(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.openrouter_api_key.clone(),
            model: self.ai_model.clone(),
            referer: self.site_url.clone(),
            ..ProviderConfig::default()
        }
    }
}

/// Everything needed to talk to the chat-completion provider.
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// `None` disables chat entirely.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub referer: String,
    pub title: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-call timeout enforced by the upstream client.
    pub request_timeout: Duration,
    /// Delay before retrying a rate-limited attempt.
    pub retry_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENROUTER_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            referer: DEFAULT_SITE_URL.to_string(),
            title: APP_TITLE.to_string(),
            max_tokens: 500,
            temperature: 0.5,
            request_timeout: Duration::from_secs(30),
            retry_delay: Duration::from_secs(2),
            max_attempts: 2,
        }
    }
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
