//! Keep-alive pings against the agent's own public address.
//!
//! Hosting platforms that idle-suspend web processes count inbound HTTP
//! traffic as activity, so the agent requests its own address once a
//! minute. Pings are best effort: failures are logged and otherwise ignored.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{config::KeepAliveConfig, observability::metrics};

#[async_trait]
pub trait KeepAlive: Send + Sync {
    /// Fire one ping. Never fails; problems are only logged.
    async fn ping(&self);
}

/// Pings a fixed URL with a plain GET.
#[derive(Debug, Clone)]
pub struct HttpPinger {
    http: Client,
    target: String,
    timeout: Duration,
}

impl HttpPinger {
    pub fn new(http: Client, target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            target: target.into(),
            timeout,
        }
    }

    /// Build a pinger from configuration, or `None` when keep-alive is
    /// disabled or has no target.
    pub fn from_config(config: &KeepAliveConfig, http: Client) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let target = config.target()?;
        Some(Self::new(http, target, config.timeout()))
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl KeepAlive for HttpPinger {
    async fn ping(&self) {
        let result = self
            .http
            .get(&self.target)
            .timeout(self.timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::trace!(target_url = %self.target, "Keep-alive ping ok");
                metrics::record_keepalive("success");
            }
            Ok(response) => {
                tracing::warn!(
                    target_url = %self.target,
                    status = %response.status(),
                    "Keep-alive ping returned non-success status"
                );
                metrics::record_keepalive("error");
            }
            Err(e) => {
                tracing::warn!(target_url = %self.target, error = %e, "Error pinging app");
                metrics::record_keepalive("error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    #[tokio::test]
    async fn test_ping_hits_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ack"))
            .expect(1)
            .mount(&server)
            .await;

        let pinger = HttpPinger::new(
            Client::new(),
            format!("{}/", server.uri()),
            Duration::from_secs(5),
        );
        pinger.ping().await;
    }

    #[tokio::test]
    async fn test_ping_swallows_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let pinger = HttpPinger::new(Client::new(), server.uri(), Duration::from_secs(5));
        pinger.ping().await;

        // Nothing listens on the discard port; the connection error is swallowed too.
        let unreachable = HttpPinger::new(
            Client::new(),
            "http://127.0.0.1:9/",
            Duration::from_millis(500),
        );
        unreachable.ping().await;
    }

    #[test]
    fn test_from_config() {
        let disabled = KeepAliveConfig {
            enabled: false,
            app_name: Some("bot".into()),
            ..Default::default()
        };
        assert!(HttpPinger::from_config(&disabled, Client::new()).is_none());

        let enabled = KeepAliveConfig {
            app_name: Some("bot".into()),
            ..Default::default()
        };
        let pinger = HttpPinger::from_config(&enabled, Client::new()).unwrap();
        assert_eq!(pinger.target(), "https://bot.herokuapp.com/");
    }
}
