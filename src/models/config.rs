//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API endpoints
    #[serde(default)]
    pub api: ApiConfig,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        if self.api.token_url.trim().is_empty() {
            return Err(AppError::validation("api.token_url is empty"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.page_size == 0 {
            return Err(AppError::validation("crawler.page_size must be > 0"));
        }
        Ok(())
    }
}

/// Remote API endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the versioned REST API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// URL of the OAuth2 client-credentials token endpoint
    #[serde(default = "defaults::token_url")]
    pub token_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            token_url: defaults::token_url(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Posts requested per timeline page (the API caps this at 200)
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_size: defaults::page_size(),
        }
    }
}

/// API access credentials, loaded from a separate TOML file.
///
/// Either a pre-issued bearer token, or a consumer key/secret pair to
/// exchange for one at startup. Unlike [`Config`], loading is strict:
/// a run without credentials cannot do anything useful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Application consumer key
    #[serde(default)]
    pub consumer_key: String,

    /// Application consumer secret
    #[serde(default)]
    pub consumer_secret: String,

    /// Pre-issued bearer token; skips the token exchange when set
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Credentials {
    /// Load credentials from a TOML file. Fails hard on any problem.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!(
                "cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        let creds: Credentials = toml::from_str(&content)?;
        creds.validate()?;
        Ok(creds)
    }

    /// Validate that the credentials are usable.
    pub fn validate(&self) -> Result<()> {
        let has_pair = !self.consumer_key.is_empty() && !self.consumer_secret.is_empty();
        let has_token = self.bearer_token.as_deref().is_some_and(|t| !t.is_empty());
        if !has_pair && !has_token {
            return Err(AppError::config(
                "credentials must provide bearer_token or consumer_key + consumer_secret",
            ));
        }
        Ok(())
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://api.twitter.com/1.1".into()
    }
    pub fn token_url() -> String {
        "https://api.twitter.com/oauth2/token".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; trawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn page_size() -> usize {
        200
    }
}
