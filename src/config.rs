use crate::session::SessionContext;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DOCSUM_SERVER_URL is not an http(s) URL: {0}")]
    InvalidServerUrl(String),
    #[error("DOCSUM_REQUEST_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
    #[error("DOCSUM_SESSION_COOKIE contains characters that cannot be sent in a header")]
    InvalidCookie,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub session: SessionContext,
    pub session_cookie: Option<String>,
    pub export_dir: PathBuf,
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            session: SessionContext::Guest,
            session_cookie: None,
            export_dir: default_export_dir(),
            request_timeout: None,
        }
    }
}

fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = non_empty("DOCSUM_SERVER_URL") {
            let parsed =
                reqwest::Url::parse(&url).map_err(|_| ConfigError::InvalidServerUrl(url.clone()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidServerUrl(url));
            }
            config.server_url = url;
        }

        if let Some(username) = non_empty("DOCSUM_USER") {
            config.session = SessionContext::Member {
                username: username.trim().to_string(),
                admin: non_empty("DOCSUM_ADMIN").is_some_and(|value| is_truthy(&value)),
            };
        }

        config.session_cookie = non_empty("DOCSUM_SESSION_COOKIE");

        if let Some(dir) = non_empty("DOCSUM_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }

        if let Some(raw) = non_empty("DOCSUM_REQUEST_TIMEOUT_SECS") {
            let seconds: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            if seconds == 0 {
                return Err(ConfigError::InvalidTimeout(raw));
            }
            config.request_timeout = Some(Duration::from_secs(seconds));
        }

        Ok(config)
    }
}
