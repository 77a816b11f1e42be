use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::DtrError;

/// Parse an `HH:MM:SS` duration into seconds.
///
/// Hours are unbounded (a rendered total can run past `480:00:00`), minutes and
/// seconds must be below 60. Anything else, the empty "not recorded" string
/// included, yields `None`, as does an hour count too large for `i64` seconds.
pub fn parse_hms(s: &str) -> Option<i64> {
    let mut fields = s.trim().split(':');
    let (h, m, sec) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() {
        return None;
    }

    let h: i64 = parse_field(h)?;
    let m: i64 = parse_field(m)?;
    let sec: i64 = parse_field(sec)?;
    if m >= 60 || sec >= 60 {
        return None;
    }

    h.checked_mul(3600)?.checked_add(m * 60 + sec)
}

fn parse_field(field: &str) -> Option<i64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Format seconds as zero-padded `HH:MM:SS`. Negative input is clamped to zero.
pub fn format_hms(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Elapsed seconds from `start` to `end`, never negative.
pub fn seconds_between(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_seconds().max(0)
}

pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, DtrError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
        .map_err(|_| DtrError::InvalidTime(s.to_string()))
}

/// Canonical dates are `YYYY-MM-DD`; `MM-DD-YYYY` is still accepted from
/// older clients and converted here.
pub fn parse_date_param(s: &str) -> Result<NaiveDate, DtrError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m-%d-%Y"))
        .map_err(|_| DtrError::InvalidDate(s.to_string()))
}

/// A duration in whole seconds, serialized as `HH:MM:SS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hms(i64);

impl Hms {
    pub const ZERO: Hms = Hms(0);

    pub fn from_secs(seconds: i64) -> Self {
        Hms(seconds.max(0))
    }

    pub fn from_hours(hours: i64) -> Self {
        Hms::from_secs(hours.saturating_mul(3600))
    }

    pub fn as_secs(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hms(self.0))
    }
}

impl FromStr for Hms {
    type Err = DtrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hms(s)
            .map(Hms::from_secs)
            .ok_or_else(|| DtrError::InvalidDuration(s.to_string()))
    }
}

impl Add for Hms {
    type Output = Hms;

    fn add(self, rhs: Hms) -> Hms {
        Hms(self.0.saturating_add(rhs.0))
    }
}

/// Saturates at zero.
impl Sub for Hms {
    type Output = Hms;

    fn sub(self, rhs: Hms) -> Hms {
        Hms((self.0 - rhs.0).max(0))
    }
}

impl Sum for Hms {
    fn sum<I: Iterator<Item = Hms>>(iter: I) -> Hms {
        iter.fold(Hms::ZERO, |acc, h| acc + h)
    }
}

impl Serialize for Hms {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hms(self.0))
    }
}

impl<'de> Deserialize<'de> for Hms {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_values() {
        assert_eq!(parse_hms("00:00:00"), Some(0));
        assert_eq!(parse_hms("08:30:15"), Some(8 * 3600 + 30 * 60 + 15));
        assert_eq!(parse_hms("480:00:00"), Some(480 * 3600));
    }

    #[test]
    fn rejects_malformed_values() {
        for s in ["", "08:00", "08:00:00:00", "aa:bb:cc", "08:60:00", "08:00:61", "-1:00:00", "8::00"] {
            assert_eq!(parse_hms(s), None, "{s:?} should not parse");
        }
    }

    #[test]
    fn oversized_hours_are_rejected() {
        assert_eq!(parse_hms("9999999999999999:00:00"), None);
        assert_eq!(parse_hms("99999999999999999999:00:00"), None);
        assert!("9999999999999999:00:00".parse::<Hms>().is_err());
        assert!(serde_json::from_str::<Hms>("\"9999999999999999:00:00\"").is_err());

        let max_hours = i64::MAX / 3600;
        let parsed: Hms = format!("{max_hours}:00:00").parse().unwrap();
        assert!(parsed.as_secs() > 0);
    }

    #[test]
    fn format_round_trips_in_range_values() {
        for s in ["00:00:00", "00:00:59", "07:59:59", "12:00:00", "23:59:59", "478:00:00"] {
            assert_eq!(format_hms(parse_hms(s).unwrap()), s);
        }
    }

    #[test]
    fn format_clamps_negative_to_zero() {
        assert_eq!(format_hms(-3600), "00:00:00");
        assert_eq!(Hms::from_secs(-1).to_string(), "00:00:00");
    }

    #[test]
    fn subtraction_saturates() {
        let total: Hms = "01:00:00".parse().unwrap();
        let leave: Hms = "02:00:00".parse().unwrap();
        assert_eq!(total - leave, Hms::ZERO);
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Hms::from_secs(3661)).unwrap();
        assert_eq!(json, "\"01:01:01\"");
        let back: Hms = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_secs(), 3661);
        assert!(serde_json::from_str::<Hms>("\"1:2\"").is_err());
    }

    #[test]
    fn seconds_between_never_negative() {
        let a = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let b = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(seconds_between(a, b), 4 * 3600);
        assert_eq!(seconds_between(b, a), 0);
    }

    #[test]
    fn date_params_accept_both_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 7).unwrap();
        assert_eq!(parse_date_param("2025-04-07").unwrap(), expected);
        assert_eq!(parse_date_param("04-07-2025").unwrap(), expected);
        assert!(parse_date_param("07/04/2025").is_err());
    }
}
