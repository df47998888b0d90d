use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

pub const BASE_URL_VAR: &str = "API_BASE_URL";
pub const REVEAL_TICK_VAR: &str = "DOCCHAT_REVEAL_TICK_MS";
pub const REQUEST_TIMEOUT_VAR: &str = "DOCCHAT_REQUEST_TIMEOUT_SECS";

const DEFAULT_REVEAL_TICK_MS: u64 = 20;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not defined in environment variables")]
    Missing(&'static str),
    #[error("{var} is not a valid URL: {value}")]
    InvalidUrl { var: &'static str, value: String },
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Process configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub reveal_tick: Duration,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup(BASE_URL_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing(BASE_URL_VAR))?;

        let api_base_url = Url::parse(&raw_url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| ConfigError::InvalidUrl {
                var: BASE_URL_VAR,
                value: raw_url.clone(),
            })?;

        let reveal_tick_ms = read_number(&lookup, REVEAL_TICK_VAR, DEFAULT_REVEAL_TICK_MS)?;
        let timeout_secs = read_number(&lookup, REQUEST_TIMEOUT_VAR, DEFAULT_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            api_base_url,
            reveal_tick: Duration::from_millis(reveal_tick_ms),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Joins an endpoint path onto the base URL, tolerating a trailing slash
    /// or a path prefix on the base.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn read_number(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}
