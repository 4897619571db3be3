use thiserror::Error;

use crate::config_env::{
    optional_trimmed_env, parse_bool_env, parse_http_url_env, parse_optional_u64_env,
    require_non_empty_env,
};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct:free";
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000/api/chat";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub stream_by_default: bool,
    pub provider: ProviderConfig,
}

/// Everything the relay needs to reach the completion provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub chat_completions_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: Option<u64>,
    pub site_url: Option<String>,
    pub site_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    pub relay_url: String,
    pub stream: bool,
    /// Unset means the client waits on the relay connection indefinitely.
    pub connect_timeout_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid boolean in env var {0}")]
    ParseBool(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to load .env file: {0}")]
    Dotenv(String),
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: optional_trimmed_env("RELAY_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            stream_by_default: parse_bool_env("RELAY_STREAM", true)?,
            provider: ProviderConfig::from_env()?,
        })
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            chat_completions_url: parse_http_url_env(
                "OPENROUTER_CHAT_COMPLETIONS_URL",
                DEFAULT_CHAT_COMPLETIONS_URL,
            )?,
            api_key: require_non_empty_env("OPENROUTER_API_KEY")?,
            model: optional_trimmed_env("OPENROUTER_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_ms: parse_optional_u64_env("OPENROUTER_TIMEOUT_MS")?,
            site_url: optional_trimmed_env("SITE_URL"),
            site_name: optional_trimmed_env("SITE_NAME"),
        })
    }
}

impl ChatClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            relay_url: parse_http_url_env("MATHERBOT_RELAY_URL", DEFAULT_RELAY_URL)?,
            stream: parse_bool_env("MATHERBOT_STREAM", true)?,
            connect_timeout_ms: parse_optional_u64_env("MATHERBOT_CONNECT_TIMEOUT_MS")?,
        })
    }
}

/// Loads `.env` from the working directory if one exists. A missing file is fine.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err.to_string())),
    }
}
