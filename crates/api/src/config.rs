use std::collections::BTreeMap;
use std::str::FromStr;

use promptvault_core::provider::{
    setting_keys, ProviderConfig, DEFAULT_PROVIDER_KIND, ENV_DEFAULT_PROVIDER_ID,
    SETTINGS_PROVIDER_ID,
};
use promptvault_llm::client::{DEFAULT_API_URL, DEFAULT_MODEL};
use promptvault_llm::relay::DEFAULT_RELAY_CAPACITY;

/// A configuration variable that is set but cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be a valid {expected} (got '{value}')")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

/// Provider synthesized from `LLM_*` variables when none are stored.
#[derive(Debug, Clone)]
pub struct LlmEnvConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    /// Server-wide optimize system prompt. Empty means unset.
    pub system_prompt: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Buffered events between an upstream stream and its SSE response.
    pub relay_channel_capacity: usize,
    /// Test-history records kept per prompt.
    pub test_history_retention: i64,
    pub llm: LlmEnvConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                                             |
    /// |--------------------------|-----------------------------------------------------|
    /// | `HOST`                   | `0.0.0.0`                                           |
    /// | `PORT`                   | `8080`                                              |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`                             |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                                |
    /// | `RELAY_CHANNEL_CAPACITY` | `32`                                                |
    /// | `TEST_HISTORY_RETENTION` | `20`                                                |
    /// | `LLM_API_KEY`            | empty (no env default provider)                     |
    /// | `LLM_API_URL`            | `https://dashscope.aliyuncs.com/compatible-mode/v1` |
    /// | `LLM_MODEL`              | `qwen-turbo`                                        |
    /// | `LLM_SYSTEM_PROMPT`      | empty                                               |
    pub fn from_env() -> Result<Self, ConfigError> {
        let cors_origins = var_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 8080, "u16")?,
            cors_origins,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30, "u64")?,
            relay_channel_capacity: parse_var(
                "RELAY_CHANNEL_CAPACITY",
                DEFAULT_RELAY_CAPACITY,
                "positive integer",
            )?,
            test_history_retention: parse_positive("TEST_HISTORY_RETENTION", 20)?,
            llm: LlmEnvConfig {
                api_key: var_or("LLM_API_KEY", ""),
                api_url: var_or("LLM_API_URL", DEFAULT_API_URL),
                model: var_or("LLM_MODEL", DEFAULT_MODEL),
                system_prompt: var_or("LLM_SYSTEM_PROMPT", ""),
            },
        })
    }

    /// The provider described by `LLM_*` variables, if an API key is set.
    pub fn env_provider(&self) -> Option<ProviderConfig> {
        if self.llm.api_key.trim().is_empty() {
            return None;
        }
        Some(ProviderConfig {
            id: ENV_DEFAULT_PROVIDER_ID.to_string(),
            name: "Default (environment)".to_string(),
            provider: DEFAULT_PROVIDER_KIND.to_string(),
            api_key: self.llm.api_key.clone(),
            api_url: Some(self.llm.api_url.clone()),
            model: self.llm.model.clone(),
            system_prompt: None,
            is_default: true,
        })
    }

    /// The provider described by `llm_*` keys of the settings store, if
    /// `llm_api_key` is set. Missing URL and model fall back to the `LLM_*`
    /// configuration.
    pub fn settings_provider(&self, settings: &BTreeMap<String, String>) -> Option<ProviderConfig> {
        let get = |key: &str| {
            settings
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };
        let api_key = get(setting_keys::API_KEY)?;
        Some(ProviderConfig {
            id: SETTINGS_PROVIDER_ID.to_string(),
            name: get(setting_keys::NAME).unwrap_or("Default (settings)").to_string(),
            provider: DEFAULT_PROVIDER_KIND.to_string(),
            api_key: api_key.to_string(),
            api_url: Some(get(setting_keys::API_URL).unwrap_or(&self.llm.api_url).to_string()),
            model: get(setting_keys::MODEL).unwrap_or(&self.llm.model).to_string(),
            system_prompt: get(setting_keys::SYSTEM_PROMPT).map(str::to_string),
            is_default: true,
        })
    }

    /// Server-wide optimize system prompt, when configured.
    pub fn system_prompt(&self) -> Option<&str> {
        Some(self.llm.system_prompt.as_str()).filter(|p| !p.trim().is_empty())
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError {
            var: name,
            expected,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Like [`parse_var`], but values below 1 are rejected.
fn parse_positive(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => positive_value(name, raw),
        Err(_) => Ok(default),
    }
}

fn positive_value(name: &'static str, raw: String) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(ConfigError {
            var: name,
            expected: "positive integer",
            value: raw,
        }),
    }
}
