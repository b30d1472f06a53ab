// ABOUTME: Conversion of date-like values into absolute timestamps
// ABOUTME: Accepts epoch milliseconds, chrono date-times, SystemTime, and text

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Naive formats tried for text targets, interpreted in local time
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Something that can be turned into an absolute virtual timestamp
#[derive(Debug, Clone, PartialEq)]
pub enum TimeTarget {
    /// Milliseconds since the Unix epoch
    Millis(f64),
    /// Free-form text (epoch ms, RFC 3339, or a local date/time)
    Text(String),
}

impl TimeTarget {
    /// Resolve to epoch milliseconds, or `None` if the value is not a
    /// usable timestamp
    pub fn resolve(&self) -> Option<f64> {
        match self {
            TimeTarget::Millis(ms) => ms.is_finite().then_some(*ms),
            TimeTarget::Text(text) => parse_text(text.trim()),
        }
    }
}

fn parse_text(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }

    if let Ok(ms) = text.parse::<f64>() {
        return ms.is_finite().then_some(ms);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime_ms(&dt));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return local_ms(naive);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(local_ms)
}

fn local_ms(naive: NaiveDateTime) -> Option<f64> {
    // Ambiguous local times (DST fold) take the earlier instant
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| datetime_ms(&dt))
}

fn datetime_ms<Tz: TimeZone>(dt: &DateTime<Tz>) -> f64 {
    dt.timestamp_micros() as f64 / 1000.0
}

impl From<f64> for TimeTarget {
    fn from(ms: f64) -> Self {
        TimeTarget::Millis(ms)
    }
}

impl From<i64> for TimeTarget {
    fn from(ms: i64) -> Self {
        TimeTarget::Millis(ms as f64)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimeTarget {
    fn from(dt: DateTime<Tz>) -> Self {
        TimeTarget::Millis(datetime_ms(&dt))
    }
}

impl From<SystemTime> for TimeTarget {
    fn from(time: SystemTime) -> Self {
        let ms = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs_f64() * 1000.0,
            Err(before) => -(before.duration().as_secs_f64() * 1000.0),
        };
        TimeTarget::Millis(ms)
    }
}

impl From<&str> for TimeTarget {
    fn from(text: &str) -> Self {
        TimeTarget::Text(text.to_string())
    }
}

impl From<String> for TimeTarget {
    fn from(text: String) -> Self {
        TimeTarget::Text(text)
    }
}

impl fmt::Display for TimeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeTarget::Millis(ms) => write!(f, "{ms}"),
            TimeTarget::Text(text) => write!(f, "{text:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_millis() {
        assert_eq!(TimeTarget::from(1_000_000.0).resolve(), Some(1_000_000.0));
        assert_eq!(TimeTarget::from(-5i64).resolve(), Some(-5.0));
        assert_eq!(TimeTarget::from(f64::NAN).resolve(), None);
        assert_eq!(TimeTarget::from(f64::INFINITY).resolve(), None);
    }

    #[test]
    fn test_numeric_text() {
        assert_eq!(TimeTarget::from(" 1700000000000 ").resolve(), Some(1_700_000_000_000.0));
        assert_eq!(TimeTarget::from("inf").resolve(), None);
    }

    #[test]
    fn test_rfc3339_text() {
        let target = TimeTarget::from("2024-03-01T12:00:00Z");
        assert_eq!(target.resolve(), Some(1_709_294_400_000.0));

        let offset = TimeTarget::from("2024-03-01T14:00:00+02:00");
        assert_eq!(offset.resolve(), Some(1_709_294_400_000.0));
    }

    #[test]
    fn test_local_text_forms_agree() {
        let minute = TimeTarget::from("2024-03-01T12:00").resolve();
        let seconds = TimeTarget::from("2024-03-01T12:00:00").resolve();
        let spaced = TimeTarget::from("2024-03-01 12:00:00").resolve();

        assert!(minute.is_some());
        assert_eq!(minute, seconds);
        assert_eq!(minute, spaced);
    }

    #[test]
    fn test_date_only_is_local_midnight() {
        let date = TimeTarget::from("2024-03-01").resolve();
        let midnight = TimeTarget::from("2024-03-01T00:00").resolve();
        assert!(date.is_some());
        assert_eq!(date, midnight);
    }

    #[test]
    fn test_garbage_text() {
        assert_eq!(TimeTarget::from("").resolve(), None);
        assert_eq!(TimeTarget::from("next tuesday").resolve(), None);
        assert_eq!(TimeTarget::from("2024-13-45").resolve(), None);
    }

    #[test]
    fn test_chrono_and_system_time() {
        let dt = Utc.timestamp_millis_opt(1_234_567).unwrap();
        assert_eq!(TimeTarget::from(dt).resolve(), Some(1_234_567.0));

        let system = UNIX_EPOCH + Duration::from_millis(2_500);
        assert_eq!(TimeTarget::from(system).resolve(), Some(2_500.0));

        let before = UNIX_EPOCH - Duration::from_millis(2_500);
        assert_eq!(TimeTarget::from(before).resolve(), Some(-2_500.0));
    }
}
