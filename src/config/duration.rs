//! Human-readable duration strings.
//!
//! Durations are written as one or more `<number><unit>` pairs, for example
//! `182d`, `4380h`, `1h30m` or `1.5h`. Supported units are `ns`, `us` (or
//! `µs`), `ms`, `s`, `m`, `h`, `d` and `w`. A leading `+` is accepted; negative
//! durations are not.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

use super::ConfigError;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Unit names and their length in nanoseconds.
const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("ms", 1_000_000),
    ("s", NANOS_PER_SEC),
    ("m", 60 * NANOS_PER_SEC),
    ("h", 3_600 * NANOS_PER_SEC),
    ("d", 86_400 * NANOS_PER_SEC),
    ("w", 604_800 * NANOS_PER_SEC),
];

/// Units used when formatting, largest first.
const FORMAT_UNITS: &[&str] = &["d", "h", "m", "s", "ms", "us", "ns"];

fn unit_nanos(unit: &str) -> Option<u128> {
    UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, nanos)| *nanos)
}

/// Parse a duration such as `182d`, `1h30m` or `1.5h`.
///
/// Fractions below one nanosecond are truncated.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(input.to_string());
    let trimmed = input.trim();
    let mut rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let factor = unit_nanos(unit).ok_or_else(invalid)?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(factor).ok_or_else(invalid)?;

        let mut scale = factor;
        for digit in fraction.bytes() {
            scale /= 10;
            if scale == 0 {
                break;
            }
            nanos += u128::from(digit - b'0') * scale;
        }

        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Format a duration using the largest units that divide it evenly.
pub fn format_duration(duration: Duration) -> String {
    let mut remaining = duration.as_nanos();
    if remaining == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for name in FORMAT_UNITS {
        let Some(factor) = unit_nanos(name) else {
            continue;
        };
        let count = remaining / factor;
        if count > 0 {
            out.push_str(&format!("{count}{name}"));
            remaining -= count * factor;
        }
    }
    out
}

/// Serde adapter for `Duration` fields written as duration strings.
pub mod serde_str {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("182d", Duration::from_secs(182 * 86_400))]
    #[case("4380h", Duration::from_secs(4380 * 3_600))]
    #[case("1h30m", Duration::from_secs(5_400))]
    #[case("250ms", Duration::from_millis(250))]
    #[case("2w", Duration::from_secs(14 * 86_400))]
    #[case(" 45s ", Duration::from_secs(45))]
    #[case("1.5h", Duration::from_secs(5_400))]
    #[case(".5s", Duration::from_millis(500))]
    #[case("300us", Duration::from_micros(300))]
    #[case("300µs", Duration::from_micros(300))]
    #[case("42ns", Duration::from_nanos(42))]
    #[case("+2h", Duration::from_secs(7_200))]
    #[case("4380h0m0s", Duration::from_secs(4380 * 3_600))]
    fn test_parse_valid(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("d")]
    #[case("10")]
    #[case("10y")]
    #[case("-3d")]
    #[case("1..5h")]
    #[case(".h")]
    #[case("1.5")]
    #[case("+")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(matches!(
            parse_duration(input),
            Err(ConfigError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(182 * 86_400)), "182d");
        assert_eq!(format_duration(Duration::from_secs(5_400)), "1h30m");
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_micros(1_500)), "1ms500us");
    }

    #[test]
    fn test_format_parses_back() {
        let original = Duration::from_millis(90_061_001);
        assert_eq!(parse_duration(&format_duration(original)).unwrap(), original);
    }
}
