//! Keep-alive configuration.
//!
//! Some hosting platforms suspend web processes that receive no traffic for
//! a while. The agent defeats this by requesting its own public address on a
//! fixed cadence.
//!
//! # Example
//!
//! ```toml
//! [keepalive]
//! enabled = true
//! app_name = "my-app"                # pings https://my-app.herokuapp.com/
//! # url = "https://example.com/"     # or an explicit address
//! timeout_secs = 10
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Keep-alive ping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeepAliveConfig {
    /// Whether to ping the agent's own address.
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Explicit address to ping. Takes precedence over `app_name`.
    #[serde(default)]
    pub url: Option<String>,

    /// Platform app name, used to derive the address when `url` is unset.
    #[serde(default)]
    pub app_name: Option<String>,

    /// Timeout for a single ping.
    /// Default: 10 seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            app_name: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    10
}

impl KeepAliveConfig {
    /// The address to ping, if one can be determined.
    pub fn target(&self) -> Option<String> {
        if let Some(url) = &self.url {
            return Some(url.clone());
        }
        self.app_name
            .as_deref()
            .map(|name| format!("https://{name}.herokuapp.com/"))
    }

    /// Get the ping timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if let Some(name) = &self.app_name
            && name.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "keepalive.app_name must not be empty".into(),
            ));
        }
        let Some(target) = self.target() else {
            return Err(ConfigError::Validation(
                "keepalive is enabled but neither keepalive.url nor keepalive.app_name is set"
                    .into(),
            ));
        };
        let parsed = url::Url::parse(&target).map_err(|e| {
            ConfigError::Validation(format!("keepalive target {target} is not a valid URL: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "keepalive target {target} must use http or https"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_app_name() {
        let config = KeepAliveConfig {
            app_name: Some("sweeper-bot".into()),
            ..Default::default()
        };
        assert_eq!(
            config.target().as_deref(),
            Some("https://sweeper-bot.herokuapp.com/")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_url_takes_precedence() {
        let config = KeepAliveConfig {
            url: Some("http://localhost:9000/".into()),
            app_name: Some("sweeper-bot".into()),
            ..Default::default()
        };
        assert_eq!(config.target().as_deref(), Some("http://localhost:9000/"));
    }

    #[test]
    fn test_enabled_without_target_invalid() {
        let config = KeepAliveConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_disabled_without_target_ok() {
        let config: KeepAliveConfig = toml::from_str("enabled = false").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_http_scheme_invalid() {
        let config = KeepAliveConfig {
            url: Some("ftp://example.com/".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
