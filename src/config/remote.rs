//! Remote API configuration.
//!
//! # Example
//!
//! ```toml
//! [remote]
//! base_url = "https://api.twitter.com"
//! user_id = "${TWITTER_USER_ID}"
//! access_token = "${TWITTER_ACCESS_TOKEN}"
//! timeout_secs = 30
//! page_size = 100
//! max_pages = 32
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Connection settings for the social API that hosts the posts.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Base URL of the API, without a trailing path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Numeric ID of the account whose posts are managed.
    pub user_id: String,

    /// OAuth 2.0 user-context access token.
    pub access_token: String,

    /// Whole-request timeout applied to every list page and delete call.
    /// Default: 30 seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Posts requested per page when listing (the API accepts 5 to 100).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Maximum number of pages fetched by a single refresh.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

// The access token must never end up in logs.
impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .field("access_token", &"****")
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

pub(super) fn default_base_url() -> String {
    "https://api.twitter.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    32
}

impl RemoteConfig {
    /// Build a config with the given credentials and default tuning.
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            user_id: user_id.into(),
            access_token: access_token.into(),
            timeout_secs: default_timeout(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Validation("remote.user_id must not be empty".into()));
        }
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "remote.access_token must not be empty".into(),
            ));
        }
        if !(5..=100).contains(&self.page_size) {
            return Err(ConfigError::Validation(format!(
                "remote.page_size must be between 5 and 100, got {}",
                self.page_size
            )));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Validation("remote.max_pages must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "remote.timeout_secs must be at least 1".into(),
            ));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            ConfigError::Validation(format!("remote.base_url is not a valid URL: {e}"))
        })?;
        Ok(())
    }
}
