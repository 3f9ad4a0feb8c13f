//! Clients for the remote API that hosts the resources.
//!
//! The scheduler only needs two operations, captured by [`ResourceClient`]:
//! list everything the account owns, and delete one item by ID. Both are
//! treated as slow and fallible; bounding their latency is the client's job.
//!
//! - [`TwitterClient`]: the v2 HTTP API over `reqwest`.
//! - [`InMemoryClient`]: an in-process stand-in with injectable failures.

mod memory;
mod twitter;

use async_trait::async_trait;
pub use memory::InMemoryClient;
use thiserror::Error;
pub use twitter::TwitterClient;

use crate::resources::{Resource, ResourceId};

#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// List every resource currently owned by the account.
    async fn list(&self) -> Result<Vec<Resource>, ClientError>;

    /// Delete a single resource. `Ok` means the remote confirmed the deletion.
    async fn delete(&self, id: &ResourceId) -> Result<(), ClientError>;
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Remote API returned {status}: {body}")]
    Status {
        status: http::StatusCode,
        body: String,
    },

    #[error("Remote API did not confirm deletion of {0}")]
    NotDeleted(ResourceId),

    #[error("Failed to decode remote response: {0}")]
    Decode(String),

    #[error("Remote API unavailable: {0}")]
    Unavailable(String),
}

impl ClientError {
    /// Short label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(e) if e.is_timeout() => "timeout",
            Self::Request(_) => "request",
            Self::Status { status, .. } if *status == http::StatusCode::TOO_MANY_REQUESTS => {
                "rate_limited"
            }
            Self::Status { .. } => "status",
            Self::NotDeleted(_) => "not_deleted",
            Self::Decode(_) => "decode",
            Self::Unavailable(_) => "unavailable",
        }
    }
}
