//! HTTP acknowledgment endpoint.
//!
//! The agent has no real API. The listener exists so the hosting platform's
//! health checks (and the agent's own keep-alive pings) have something to
//! hit: any request to `/` or `/health` is answered with `ack`.

use std::{io, net::SocketAddr, time::Duration};

use axum::{Router, response::IntoResponse, routing::any};
use http::StatusCode;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

#[cfg(feature = "prometheus")]
use crate::observability::metrics::get_prometheus_handle;

/// Body returned by the acknowledgment routes.
pub const ACK_BODY: &str = "ack";

/// Build the router serving the acknowledgment routes.
pub fn router() -> Router {
    Router::new()
        .route("/", any(ack))
        .route("/health", any(ack))
        .route("/metrics", axum::routing::get(metrics))
        .layer(TraceLayer::new_for_http())
}

#[tracing::instrument(name = "http.ack")]
async fn ack() -> impl IntoResponse {
    (StatusCode::OK, ACK_BODY)
}

/// Prometheus metrics endpoint.
///
/// Returns metrics in Prometheus text format.
#[tracing::instrument(name = "http.metrics")]
async fn metrics() -> impl IntoResponse {
    #[cfg(feature = "prometheus")]
    {
        match get_prometheus_handle() {
            Some(handle) => (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            ),
            None => (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            ),
        }
    }
    #[cfg(not(feature = "prometheus"))]
    (
        StatusCode::NOT_FOUND,
        [("content-type", "text/plain")],
        "Prometheus metrics not enabled".to_string(),
    )
}

/// Listener errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("HTTP server failed: {0}")]
    Serve(#[from] io::Error),
}

/// A running HTTP listener that can be drained.
///
/// The scheduler holds this while running and drains it once cancellation is
/// observed: the listener stops accepting connections and in-flight requests
/// get up to a grace period to finish.
#[derive(Debug)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), ServerError>>,
}

impl ListenerHandle {
    /// Bind `addr` and start serving `app` on a background task.
    pub async fn bind(addr: &str, app: Router) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Self::serve(listener, app)
    }

    /// Start serving `app` on an already bound listener.
    pub fn serve(listener: TcpListener, app: Router) -> Result<Self, ServerError> {
        let local_addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone().cancelled_owned();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await
                .map_err(ServerError::from)
        });

        tracing::info!("Server listening on http://{}", local_addr);

        Ok(Self {
            local_addr,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait up to `grace` for in-flight
    /// requests. Returns `true` if the listener finished within the grace
    /// period.
    pub async fn drain(self, grace: Duration) -> bool {
        self.shutdown.cancel();

        let mut task = self.task;
        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!("HTTP listener drained");
                true
            }
            Ok(Ok(Err(e))) => {
                tracing::error!(error = %e, "HTTP listener exited with an error");
                true
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "HTTP listener task panicked");
                true
            }
            Err(_) => {
                tracing::warn!(
                    grace_secs = grace.as_secs_f64(),
                    "Timeout waiting for in-flight requests, aborting listener"
                );
                task.abort();
                false
            }
        }
    }
}
