//! Configuration module for the agent.
//!
//! The agent is configured either via a TOML file, with support for
//! environment variable interpolation using `${VAR_NAME}` syntax, or purely
//! from environment variables (see [`AgentConfig::from_env`]).
//!
//! # Example
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [remote]
//! user_id = "${TWITTER_USER_ID}"
//! access_token = "${TWITTER_ACCESS_TOKEN}"
//!
//! [retention]
//! max_age = "182d"
//!
//! [keepalive]
//! app_name = "my-app"
//! ```

mod duration;
mod keepalive;
mod observability;
mod remote;
mod retention;
mod server;

use std::path::Path;

pub use duration::{format_duration, parse_duration};
pub use keepalive::*;
pub use observability::*;
pub use remote::*;
pub use retention::*;
use serde::{Deserialize, Serialize};
pub use server::*;

/// Environment variable holding the listen port (env-only mode).
pub const ENV_PORT: &str = "PORT";
/// Environment variable holding the platform app name (env-only mode).
pub const ENV_APP_NAME: &str = "HEROKU_NAME";
/// Environment variable holding the API access token (env-only mode).
pub const ENV_ACCESS_TOKEN: &str = "TWITTER_ACCESS_TOKEN";
/// Environment variable holding the account ID (env-only mode).
pub const ENV_USER_ID: &str = "TWITTER_USER_ID";
/// Optional environment variable overriding the retention horizon.
///
/// Accepts decimal values with `ns`, `us`, `ms`, `s`, `m`, `h`, `d` or `w`
/// units and an optional leading `+` (`4380h`, `1.5h`, `300us`). Negative
/// values are rejected since they make every post expired.
pub const ENV_MAX_AGE: &str = "TWEETSTORIES_MAX_AGE";
/// Optional environment variable overriding the API base URL.
pub const ENV_API_BASE_URL: &str = "TWITTER_API_BASE_URL";

/// Root configuration for the agent.
///
/// Only the `remote` section is required; everything else has defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote API connection settings.
    pub remote: RemoteConfig,

    /// Retention horizon and sweep safety settings.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Keep-alive ping configuration.
    #[serde(default)]
    pub keepalive: KeepAliveConfig,

    /// Observability configuration (logging, metrics).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AgentConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: AgentConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the process environment.
    ///
    /// `PORT`, `HEROKU_NAME`, `TWITTER_ACCESS_TOKEN` and `TWITTER_USER_ID` are
    /// required. `TWEETSTORIES_MAX_AGE` and `TWITTER_API_BASE_URL` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
        };

        let port = required(ENV_PORT)?;
        let port: u16 = port.trim().parse().map_err(|_| {
            ConfigError::Validation(format!("${ENV_PORT} is not a valid port: {port}"))
        })?;
        let app_name = required(ENV_APP_NAME)?;
        let access_token = required(ENV_ACCESS_TOKEN)?;
        let user_id = required(ENV_USER_ID)?;

        let mut remote = RemoteConfig::new(user_id, access_token);
        if let Some(base_url) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
            remote.base_url = base_url;
        }

        let mut retention = RetentionConfig::default();
        if let Some(max_age) = lookup(ENV_MAX_AGE).filter(|v| !v.trim().is_empty()) {
            retention.max_age = parse_duration(&max_age)?;
        }

        let config = AgentConfig {
            server: ServerConfig {
                port,
                ..Default::default()
            },
            remote,
            retention,
            keepalive: KeepAliveConfig {
                app_name: Some(app_name),
                ..Default::default()
            },
            observability: ObservabilityConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.remote.validate()?;
        self.retention.validate()?;
        self.keepalive.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Required environment variable ${0} not set")]
    MissingEnv(String),

    #[error("Invalid duration {0:?} (expected e.g. \"182d\", \"4380h\", \"1h30m\")")]
    InvalidDuration(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Skips commented lines (lines where content before the variable is a comment).
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid");
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else {
                continue;
            };

            // Skip if this variable is inside a comment
            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write, time::Duration};

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const FULL_ENV: &[(&str, &str)] = &[
        ("PORT", "5000"),
        ("HEROKU_NAME", "sweeper-bot"),
        ("TWITTER_ACCESS_TOKEN", "token"),
        ("TWITTER_USER_ID", "12345"),
    ];

    #[test]
    fn test_minimal_config() {
        let config = AgentConfig::from_str(
            r#"
            [remote]
            user_id = "12345"
            access_token = "token"

            [keepalive]
            enabled = false
        "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.retention.max_age, Duration::from_secs(182 * 86_400));
        assert!(!config.keepalive.enabled);
    }

    #[test]
    fn test_missing_remote_section() {
        let result = AgentConfig::from_str("[server]\nport = 80\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_keepalive_requires_target() {
        let result = AgentConfig::from_str(
            r#"
            [remote]
            user_id = "12345"
            access_token = "token"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [remote]
            user_id = "12345"
            access_token = "token"

            [retention]
            max_age = "30d"

            [keepalive]
            url = "http://127.0.0.1:9/"
        "#
        )
        .unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.retention.max_age, Duration::from_secs(30 * 86_400));
        assert_eq!(
            config.keepalive.target().as_deref(),
            Some("http://127.0.0.1:9/")
        );
    }

    #[test]
    fn test_from_missing_file() {
        let result = AgentConfig::from_file("/nonexistent/postsweep.toml");
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }

    #[test]
    fn test_from_lookup_full() {
        let config = AgentConfig::from_lookup(lookup_from(FULL_ENV)).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.remote.user_id, "12345");
        assert_eq!(config.remote.base_url, "https://api.twitter.com");
        assert_eq!(
            config.keepalive.target().as_deref(),
            Some("https://sweeper-bot.herokuapp.com/")
        );
        assert_eq!(config.retention.max_age, Duration::from_secs(182 * 86_400));
    }

    #[test]
    fn test_from_lookup_max_age_override() {
        let mut vars = FULL_ENV.to_vec();
        vars.push(("TWEETSTORIES_MAX_AGE", "720h"));
        let config = AgentConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.retention.max_age, Duration::from_secs(30 * 86_400));
    }

    #[test]
    fn test_from_lookup_fractional_max_age() {
        let mut vars = FULL_ENV.to_vec();
        vars.push(("TWEETSTORIES_MAX_AGE", "4380.5h"));
        let config = AgentConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(
            config.retention.max_age,
            Duration::from_secs(4380 * 3_600 + 1_800)
        );
    }

    #[test]
    fn test_from_lookup_invalid_max_age() {
        let mut vars = FULL_ENV.to_vec();
        vars.push(("TWEETSTORIES_MAX_AGE", "soon"));
        let result = AgentConfig::from_lookup(lookup_from(&vars));
        assert!(matches!(result, Err(ConfigError::InvalidDuration(_))));
    }

    #[test]
    fn test_from_lookup_missing_required() {
        for missing in ["PORT", "HEROKU_NAME", "TWITTER_ACCESS_TOKEN", "TWITTER_USER_ID"] {
            let vars: Vec<_> = FULL_ENV
                .iter()
                .copied()
                .filter(|(k, _)| *k != missing)
                .collect();
            match AgentConfig::from_lookup(lookup_from(&vars)) {
                Err(ConfigError::MissingEnv(name)) => assert_eq!(name, missing),
                other => panic!("expected MissingEnv({missing}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_from_lookup_empty_counts_as_missing() {
        let mut vars = FULL_ENV.to_vec();
        vars.retain(|(k, _)| *k != "TWITTER_ACCESS_TOKEN");
        vars.push(("TWITTER_ACCESS_TOKEN", ""));
        let result = AgentConfig::from_lookup(lookup_from(&vars));
        assert!(matches!(result, Err(ConfigError::MissingEnv(_))));
    }

    #[test]
    fn test_from_lookup_bad_port() {
        let mut vars = FULL_ENV.to_vec();
        vars.retain(|(k, _)| *k != "PORT");
        vars.push(("PORT", "eighty"));
        let result = AgentConfig::from_lookup(lookup_from(&vars));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("PORT", Some("5001")),
                ("HEROKU_NAME", Some("sweeper-env")),
                ("TWITTER_ACCESS_TOKEN", Some("env-token")),
                ("TWITTER_USER_ID", Some("999")),
                ("TWEETSTORIES_MAX_AGE", None),
                ("TWITTER_API_BASE_URL", Some("http://127.0.0.1:1234")),
            ],
            || {
                let config = AgentConfig::from_env().unwrap();
                assert_eq!(config.server.port, 5001);
                assert_eq!(config.remote.user_id, "999");
                assert_eq!(config.remote.base_url, "http://127.0.0.1:1234");
            },
        );
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TEST_POSTSWEEP_TOKEN", Some("sk-secret"), || {
            let result = expand_env_vars("key = \"${TEST_POSTSWEEP_TOKEN}\"").unwrap();
            assert_eq!(result, "key = \"sk-secret\"");
        });
    }

    #[test]
    fn test_env_var_missing() {
        let result = expand_env_vars("key = \"${POSTSWEEP_SURELY_UNSET_VAR}\"");
        assert!(matches!(result, Err(ConfigError::EnvVarNotFound(name)) if name == "POSTSWEEP_SURELY_UNSET_VAR"));
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let result = expand_env_vars("# access_token = \"${NONEXISTENT_VAR}\"").unwrap();
        assert_eq!(result, "# access_token = \"${NONEXISTENT_VAR}\"");
    }

    #[test]
    fn test_env_var_after_comment_ignored() {
        let result = expand_env_vars("key = \"value\" # ${NONEXISTENT_VAR}").unwrap();
        assert_eq!(result, "key = \"value\" # ${NONEXISTENT_VAR}");
    }

    #[test]
    fn test_env_var_in_full_config() {
        temp_env::with_vars(
            [
                ("TEST_PS_USER", Some("777")),
                ("TEST_PS_TOKEN", Some("abc")),
            ],
            || {
                let config = AgentConfig::from_str(
                    r#"
                    [remote]
                    user_id = "${TEST_PS_USER}"
                    access_token = "${TEST_PS_TOKEN}"

                    [keepalive]
                    enabled = false
                "#,
                )
                .unwrap();
                assert_eq!(config.remote.user_id, "777");
                assert_eq!(config.remote.access_token, "abc");
            },
        );
    }
}
