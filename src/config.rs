//! Centralized configuration management for permctl

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::locale::Locale;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the server console API, e.g. http://127.0.0.1:8848/nacos
    pub server_url: String,
    /// Credentials used to obtain an access token
    pub credentials: Option<Credentials>,
    /// Pre-issued access token; takes precedence over credentials
    pub access_token: Option<String>,
    /// HTTP client configuration
    pub http: HttpConfig,
    /// Quiet period before a username lookup is issued (milliseconds)
    pub lookup_debounce_ms: u64,
    /// Built-in locale name
    pub locale: String,
    /// Optional JSON file with locale overrides
    pub locale_file: Option<PathBuf>,
    /// Log file path
    pub log_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "permctl/0.1.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8848/nacos".to_string(),
            credentials: None,
            access_token: None,
            http: HttpConfig::default(),
            lookup_debounce_ms: 250,
            locale: "en-US".to_string(),
            locale_file: None,
            log_file: PathBuf::from("permctl.log"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let server_url = std::env::var("PERMCTL_SERVER_URL").unwrap_or(defaults.server_url);

        let credentials = match (
            std::env::var("PERMCTL_USERNAME").ok(),
            std::env::var("PERMCTL_PASSWORD").ok(),
        ) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("PERMCTL_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("PERMCTL_USER_AGENT").unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            server_url,
            credentials,
            access_token: std::env::var("PERMCTL_ACCESS_TOKEN").ok(),
            http,
            lookup_debounce_ms: parse_env_var("PERMCTL_LOOKUP_DEBOUNCE_MS")?
                .unwrap_or(defaults.lookup_debounce_ms),
            locale: std::env::var("PERMCTL_LOCALE").unwrap_or(defaults.locale),
            locale_file: std::env::var("PERMCTL_LOCALE_FILE").ok().map(PathBuf::from),
            log_file: std::env::var("PERMCTL_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        })
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Get lookup debounce as Duration
    pub fn lookup_debounce(&self) -> Duration {
        Duration::from_millis(self.lookup_debounce_ms)
    }

    /// Parsed server base URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.server_url)
            .with_context(|| format!("Invalid server URL: {}", self.server_url))
    }

    /// Build the display locale, applying the overrides file when set
    pub fn load_locale(&self) -> Result<Locale> {
        let locale = Locale::named(&self.locale);
        match &self.locale_file {
            Some(path) => locale.with_overrides_file(path),
            None => Ok(locale),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!(
                "Server URL must use http or https: {}",
                self.server_url
            ));
        }

        if self.http.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("HTTP timeout must be greater than zero"));
        }

        if let Some(path) = &self.locale_file {
            if !path.exists() {
                return Err(anyhow::anyhow!(
                    "Locale file does not exist: {}",
                    path.display()
                ));
            }
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
