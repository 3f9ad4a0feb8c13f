//! Remote resources tracked by the agent.
//!
//! A [`Resource`] is the local record of one remotely hosted post: its ID,
//! its creation timestamp exactly as the API reported it, and the raw JSON
//! payload. The payload is carried along but never interpreted here.
//!
//! - [`ResourceStore`] holds the resources known to exist remotely.
//! - [`RetentionPolicy`] decides which of them are old enough to delete.

mod policy;
mod store;
mod timestamp;

use chrono::{DateTime, Utc};
pub use policy::RetentionPolicy;
use serde::{Deserialize, Serialize};
pub use store::ResourceStore;
pub use timestamp::parse_timestamp;

/// Identifier of a remote resource.
///
/// The API hands out numeric IDs as strings; they are kept as text so IDs
/// beyond the range of `i64` or non-numeric IDs round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// A remotely hosted post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    /// Creation time as reported by the source, unparsed.
    pub created_at: String,
    /// The remote representation, opaque to the agent.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: created_at.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// The parsed creation time, or `None` if the source text is not a
    /// recognised timestamp.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resource_id_conversions() {
        assert_eq!(ResourceId::from(42_i64), ResourceId::from("42"));
        assert_eq!(ResourceId::new("1850").to_string(), "1850");
        assert_eq!(ResourceId::from(String::from("abc")).as_str(), "abc");
    }

    #[test]
    fn test_resource_created_parses() {
        let resource = Resource::new("1", "2024-03-01T12:00:00.000Z");
        assert_eq!(
            resource.created(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_resource_created_unparsable() {
        let resource = Resource::new("1", "yesterday");
        assert_eq!(resource.created(), None);
    }

    #[test]
    fn test_resource_serde_roundtrip_keeps_payload() {
        let resource = Resource::new("7", "2024-03-01T12:00:00Z")
            .with_payload(json!({"id": "7", "text": "hello"}));
        let encoded = serde_json::to_value(&resource).unwrap();
        assert_eq!(encoded["id"], "7");
        assert_eq!(encoded["payload"]["text"], "hello");
        let decoded: Resource = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, resource);
    }
}
