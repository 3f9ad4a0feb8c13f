//! Client for the v2 Twitter/X API.
//!
//! Authenticates with an OAuth 2.0 user-context bearer token. Listing walks
//! the user's timeline page by page; deletion uses `DELETE /2/tweets/{id}`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

use super::{ClientError, ResourceClient};
use crate::{
    config::RemoteConfig,
    resources::{Resource, ResourceId},
};

/// Error bodies are truncated to this many characters.
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Deserialize)]
struct TimelinePage {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    meta: PageMeta,
}

#[derive(Debug, Default, Deserialize)]
struct PageMeta {
    #[serde(default)]
    result_count: u64,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    data: DeleteData,
}

#[derive(Debug, Deserialize)]
struct DeleteData {
    deleted: bool,
}

/// [`ResourceClient`] backed by the v2 HTTP API.
#[derive(Debug, Clone)]
pub struct TwitterClient {
    http: Client,
    base_url: String,
    user_id: String,
    access_token: String,
    page_size: u32,
    max_pages: u32,
}

impl TwitterClient {
    /// Build a client with its own connection pool and the configured timeout.
    pub fn new(config: &RemoteConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("postsweep/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_http_client(config: &RemoteConfig, http: Client) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            access_token: config.access_token.clone(),
            page_size: config.page_size,
            max_pages: config.max_pages,
        }
    }

    async fn fetch_page(&self, pagination_token: Option<&str>) -> Result<TimelinePage, ClientError> {
        let url = format!("{}/2/users/{}/tweets", self.base_url, self.user_id);
        let mut query = vec![
            ("max_results", self.page_size.to_string()),
            ("tweet.fields", "created_at".to_string()),
        ];
        if let Some(token) = pagination_token {
            query.push(("pagination_token", token.to_string()));
        }

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?;

        let response = error_for_status(response).await?;
        response
            .json::<TimelinePage>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ResourceClient for TwitterClient {
    #[tracing::instrument(name = "remote.list", skip(self), fields(user_id = %self.user_id))]
    async fn list(&self) -> Result<Vec<Resource>, ClientError> {
        let mut resources = Vec::new();
        let mut next_token: Option<String> = None;

        for page in 0..self.max_pages {
            let timeline = self.fetch_page(next_token.as_deref()).await?;

            tracing::debug!(
                page,
                result_count = timeline.meta.result_count,
                "Fetched timeline page"
            );

            for item in timeline.data {
                resources.push(tweet_to_resource(item)?);
            }

            next_token = timeline.meta.next_token;
            if next_token.is_none() {
                return Ok(resources);
            }
        }

        tracing::warn!(
            max_pages = self.max_pages,
            listed = resources.len(),
            "Timeline listing truncated at max_pages; remaining posts are picked up once older ones are deleted"
        );
        Ok(resources)
    }

    #[tracing::instrument(name = "remote.delete", skip(self))]
    async fn delete(&self, id: &ResourceId) -> Result<(), ClientError> {
        let url = format!("{}/2/tweets/{}", self.base_url, id);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = error_for_status(response).await?;
        let body: DeleteResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        if body.data.deleted {
            Ok(())
        } else {
            Err(ClientError::NotDeleted(id.clone()))
        }
    }
}

/// Turn a non-success response into `ClientError::Status`, keeping the body.
async fn error_for_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status,
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

fn tweet_to_resource(item: Value) -> Result<Resource, ClientError> {
    let id = match item.get("id") {
        Some(Value::String(id)) => ResourceId::new(id.clone()),
        Some(Value::Number(id)) => ResourceId::new(id.to_string()),
        _ => {
            return Err(ClientError::Decode(format!(
                "timeline item without an id: {item}"
            )));
        }
    };
    // A missing timestamp leaves the post with an unknown age, which the
    // retention policy never deletes.
    let created_at = item
        .get("created_at")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(Resource {
        id,
        created_at,
        payload: item,
    })
}
