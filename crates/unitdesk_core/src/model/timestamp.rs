//! Canonical ISO-8601 timestamps for unit records.
//!
//! # Responsibility
//! - Hold `lastUpdated` instants at millisecond precision in UTC.
//! - Accept only the canonical `YYYY-MM-DDTHH:MM:SS.sssZ` text form.
//!
//! # Invariants
//! - `Timestamp::to_string()` parsed back yields the same instant.
//! - A string is canonical only if parse-then-format reproduces it exactly.
//! - Leap seconds and years past 9999 are never produced or accepted.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, SubsecRound, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static CANONICAL_SHAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").expect("valid timestamp regex")
});

/// Last instant with a four-digit year, `9999-12-31T23:59:59.999Z`.
static MAX_INSTANT: Lazy<DateTime<Utc>> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_milli_opt(23, 59, 59, 999))
        .expect("valid max timestamp")
        .and_utc()
});

/// Rejection reasons for timestamp text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// Text does not have the `YYYY-MM-DDTHH:MM:SS.sssZ` shape.
    NotCanonical(String),
    /// Shape matches but the date or time is out of range.
    InvalidInstant(String),
}

impl Display for TimestampError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCanonical(value) => write!(
                f,
                "`{value}` is not a canonical ISO-8601 timestamp (YYYY-MM-DDTHH:MM:SS.sssZ)"
            ),
            Self::InvalidInstant(value) => write!(f, "`{value}` is not a valid date/time"),
        }
    }
}

impl Error for TimestampError {}

/// UTC instant truncated to whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Wraps a chrono instant, dropping sub-millisecond precision.
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.trunc_subsecs(3))
    }

    /// Parses canonical text, rejecting anything that would not round-trip.
    pub fn parse_canonical(value: &str) -> Result<Self, TimestampError> {
        if !CANONICAL_SHAPE_RE.is_match(value) {
            return Err(TimestampError::NotCanonical(value.to_string()));
        }
        let parsed = DateTime::parse_from_rfc3339(value)
            .map_err(|_| TimestampError::InvalidInstant(value.to_string()))?;
        // chrono keeps `:60` as a leap second in the nanosecond field.
        if parsed.nanosecond() >= 1_000_000_000 {
            return Err(TimestampError::InvalidInstant(value.to_string()));
        }
        let timestamp = Self::from_datetime(parsed.with_timezone(&Utc));
        if timestamp.to_string() != value {
            return Err(TimestampError::NotCanonical(value.to_string()));
        }
        Ok(timestamp)
    }

    /// Returns `self`, or `previous + 1ms` when `self` would not be later
    /// than `previous`.
    ///
    /// Saturates at `9999-12-31T23:59:59.999Z` so the result stays canonical.
    pub fn after(self, previous: Timestamp) -> Self {
        let next = if self > previous {
            self.0
        } else {
            previous.0 + Duration::milliseconds(1)
        };
        Self(next.min(*MAX_INSTANT))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_canonical(s)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = TimestampError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_canonical(&value)
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{Timestamp, TimestampError};

    #[test]
    fn canonical_text_round_trips() {
        let text = "2024-03-01T08:15:30.250Z";
        let ts = Timestamp::parse_canonical(text).unwrap();
        assert_eq!(ts.to_string(), text);
    }

    #[test]
    fn rejects_missing_millis_and_offsets() {
        for text in [
            "2024-03-01T08:15:30Z",
            "2024-03-01T08:15:30.250+00:00",
            "2024-03-01T08:15:30.250+02:00",
            "2024-03-01 08:15:30.250Z",
            "2024-03-01T08:15:30.25Z",
            "2024-03-01",
        ] {
            let err = Timestamp::parse_canonical(text).unwrap_err();
            assert!(matches!(err, TimestampError::NotCanonical(_)), "{text}");
        }
    }

    #[test]
    fn rejects_impossible_dates() {
        let err = Timestamp::parse_canonical("2024-02-30T00:00:00.000Z").unwrap_err();
        assert!(matches!(err, TimestampError::InvalidInstant(_)));
    }

    #[test]
    fn rejects_leap_seconds() {
        for text in ["2016-12-31T23:59:60.000Z", "2016-12-31T23:59:60.500Z"] {
            let err = Timestamp::parse_canonical(text).unwrap_err();
            assert!(matches!(err, TimestampError::InvalidInstant(_)), "{text}");
        }
    }

    #[test]
    fn after_saturates_at_last_four_digit_year() {
        let max = Timestamp::parse_canonical("9999-12-31T23:59:59.999Z").unwrap();
        let earlier = Timestamp::parse_canonical("2024-03-01T08:15:30.250Z").unwrap();

        let bumped = earlier.after(max);
        assert_eq!(bumped, max);
        assert_eq!(Timestamp::parse_canonical(&bumped.to_string()).unwrap(), max);
    }

    #[test]
    fn now_is_canonical() {
        let now = Timestamp::now();
        assert_eq!(Timestamp::parse_canonical(&now.to_string()).unwrap(), now);
    }

    #[test]
    fn after_strictly_advances_past_previous() {
        let earlier = Timestamp::parse_canonical("2024-03-01T08:15:30.250Z").unwrap();
        let later = Timestamp::parse_canonical("2024-03-01T08:15:31.000Z").unwrap();

        assert_eq!(later.after(earlier), later);
        assert_eq!(
            earlier.after(earlier).to_string(),
            "2024-03-01T08:15:30.251Z"
        );
        assert_eq!(earlier.after(later).to_string(), "2024-03-01T08:15:31.001Z");
    }
}
