use chrono::{DateTime, Utc};

/// Legacy layout used by the v1.1 API, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const RUBY_DATE: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parse a creation timestamp in any of the layouts the API has used.
///
/// Accepts RFC 3339 (`2018-10-10T20:19:24.000Z`) and the legacy Ruby date
/// layout. Returns `None` for anything else; callers must treat an unknown
/// age as "not old enough".
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, RUBY_DATE))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
