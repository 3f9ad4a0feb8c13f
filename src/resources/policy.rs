use chrono::{DateTime, Duration, Utc};

use super::Resource;

/// Time-based retention: a resource expires once it is `max_age` old.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_age: Duration,
}

impl RetentionPolicy {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// Build a policy from a configured `std::time::Duration`.
    ///
    /// Horizons too large for chrono saturate, which simply means nothing
    /// ever expires.
    pub fn from_std(max_age: std::time::Duration) -> Self {
        Self::new(Duration::from_std(max_age).unwrap_or(Duration::MAX))
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Resources created at or before this instant are expired.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether `resource` is old enough to delete.
    ///
    /// A resource whose creation time cannot be parsed is never expired.
    pub fn is_expired(&self, resource: &Resource, now: DateTime<Utc>) -> bool {
        match resource.created() {
            Some(created) => now.signed_duration_since(created) >= self.max_age,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{SecondsFormat, TimeZone};
    use rstest::rstest;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn created(at: DateTime<Utc>) -> Resource {
        Resource::new("1", at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    fn six_months() -> RetentionPolicy {
        RetentionPolicy::new(Duration::days(182))
    }

    #[rstest]
    #[case::well_past(Duration::days(200), true)]
    #[case::exactly_max_age(Duration::days(182), true)]
    #[case::one_second_short(Duration::days(182) - Duration::seconds(1), false)]
    #[case::recent(Duration::days(10), false)]
    #[case::future(Duration::days(-1), false)]
    fn test_is_expired(#[case] age: Duration, #[case] expected: bool) {
        let resource = created(now() - age);
        assert_eq!(six_months().is_expired(&resource, now()), expected);
    }

    #[rstest]
    #[case("")]
    #[case("garbage")]
    #[case("1970-01-01")]
    fn test_unparsable_never_expires(#[case] raw: &str) {
        let resource = Resource::new("1", raw);
        let far_future = now() + Duration::days(365 * 100);
        assert!(!six_months().is_expired(&resource, far_future));
        assert!(!RetentionPolicy::new(Duration::zero()).is_expired(&resource, now()));
    }

    #[test]
    fn test_legacy_layout_is_evaluated() {
        let resource = Resource::new("1", "Mon Jan 02 15:04:05 -0700 2006");
        assert!(six_months().is_expired(&resource, now()));
    }

    #[test]
    fn test_cutoff() {
        assert_eq!(six_months().cutoff(now()), now() - Duration::days(182));
    }

    #[test]
    fn test_from_std_saturates() {
        let policy = RetentionPolicy::from_std(std::time::Duration::from_secs(u64::MAX));
        assert_eq!(policy.max_age(), Duration::MAX);
        assert_eq!(policy.cutoff(now()), DateTime::<Utc>::MIN_UTC);
        let resource = created(now() - Duration::days(365 * 50));
        assert!(!policy.is_expired(&resource, now()));
    }
}
