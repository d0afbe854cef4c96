use chrono::{DateTime, Utc};
use tracing::warn;

/// Parse an RFC 3339 timestamp as reported by the API (fractional seconds allowed)
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Unix seconds for an RFC 3339 string; 0 when empty or unparsable
pub(crate) fn rfc3339_to_unix(s: &str) -> i64 {
    if s.is_empty() {
        return 0;
    }
    match parse_timestamp(s) {
        Some(dt) => dt.timestamp(),
        None => {
            warn!(timestamp = s, "failed parsing timestamp");
            0
        }
    }
}

/// First `YYYY-MM-DD` of a timestamp string, without reinterpreting it
pub(crate) fn date_prefix(s: &str) -> Option<&str> {
    s.get(0..10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_fraction_and_zulu() {
        let dt = parse_timestamp("2019-05-06T18:29:12.345678Z").unwrap();
        assert_eq!(dt.timestamp(), 1_557_167_352);
    }

    #[test]
    fn parse_with_offset() {
        let a = parse_timestamp("2019-05-06T20:29:12+02:00").unwrap();
        let b = parse_timestamp("2019-05-06T18:29:12Z").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unix_of_empty_is_zero() {
        assert_eq!(rfc3339_to_unix(""), 0);
    }

    #[test]
    fn unix_of_garbage_is_zero() {
        assert_eq!(rfc3339_to_unix("yesterday"), 0);
    }

    #[test]
    fn unix_of_epoch() {
        assert_eq!(rfc3339_to_unix("1970-01-01T00:00:00Z"), 0);
        assert_eq!(rfc3339_to_unix("1970-01-02T00:00:00Z"), 86_400);
    }

    #[test]
    fn date_prefix_handles_short_input() {
        assert_eq!(date_prefix("2019-05-06T18:29:12Z"), Some("2019-05-06"));
        assert_eq!(date_prefix("2019"), None);
    }
}
