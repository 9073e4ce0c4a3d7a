//! Client configuration parsed from environment variables.
//!
//! Read once at startup and handed to `HttpChatStore` explicitly; nothing
//! else in the crate looks at the process environment.

use std::path::PathBuf;

use reqwest::Url;

use crate::types::ChatError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend base URL, validated, without a trailing `/`.
    pub api_url: String,
    /// Preview deployments prompt for an API token before chatting.
    pub preview: bool,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout. `None` leaves requests unbounded.
    pub request_timeout_secs: Option<u64>,
    /// Override for the local token file location.
    pub state_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            preview: false,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: None,
            state_file: None,
        }
    }
}

impl ChatConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `TICKET_CHAT_API_URL`: default `http://127.0.0.1:3000`
    /// - `TICKET_CHAT_PREVIEW`: `1`/`true`/`yes` enables preview mode
    /// - `TICKET_CHAT_CONNECT_TIMEOUT_SECS`: default 10
    /// - `TICKET_CHAT_REQUEST_TIMEOUT_SECS`: unset means no timeout
    /// - `TICKET_CHAT_STATE_FILE`: token file path
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if the API URL is not an http(s) URL with
    /// a host and no query, or the preview flag is not a recognizable boolean.
    pub fn from_env() -> Result<Self, ChatError> {
        let api_url = normalize_api_url(
            &std::env::var("TICKET_CHAT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        )?;
        let preview = parse_flag(std::env::var("TICKET_CHAT_PREVIEW").ok().as_deref())?;
        let connect_timeout_secs = env_parse("TICKET_CHAT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS);
        let request_timeout_secs = std::env::var("TICKET_CHAT_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0);
        let state_file = std::env::var_os("TICKET_CHAT_STATE_FILE").map(PathBuf::from);

        Ok(Self { api_url, preview, connect_timeout_secs, request_timeout_secs, state_file })
    }

    /// Replace the API URL, applying the same validation as [`Self::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] for anything `from_env` would reject.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ChatError> {
        self.api_url = normalize_api_url(raw)?;
        Ok(self)
    }

    /// The API URL parsed into a base for endpoint paths.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if `api_url` was set to an invalid value
    /// directly instead of through [`Self::with_api_url`].
    pub fn api_base(&self) -> Result<Url, ChatError> {
        parse_api_url(&self.api_url)
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_api_url(raw: &str) -> Result<Url, ChatError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ChatError::Config(format!("invalid TICKET_CHAT_API_URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ChatError::Config(format!("TICKET_CHAT_API_URL must be http(s): '{raw}'")));
    }
    if url.host_str().is_none() {
        return Err(ChatError::Config(format!("TICKET_CHAT_API_URL has no host: '{raw}'")));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ChatError::Config(format!("TICKET_CHAT_API_URL must not carry a query or fragment: '{raw}'")));
    }
    Ok(url)
}

fn normalize_api_url(raw: &str) -> Result<String, ChatError> {
    let url = parse_api_url(raw)?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_flag(raw: Option<&str>) -> Result<bool, ChatError> {
    match raw.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("" | "0" | "false" | "no") => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some(other) => Err(ChatError::Config(format!("unrecognized TICKET_CHAT_PREVIEW value '{other}'"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
