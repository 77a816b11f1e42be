use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::scan::DtrDay;

/// Per-day attendance outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, ToSchema)]
pub enum AttendanceStatus {
    #[strum(to_string = "Present", serialize = "present", serialize = "full-day")]
    #[serde(rename = "Present")]
    Present,
    #[strum(to_string = "Half-Day-AM", serialize = "half-day-am")]
    #[serde(rename = "Half-Day-AM")]
    HalfDayAm,
    #[strum(to_string = "Half-Day-PM", serialize = "half-day-pm")]
    #[serde(rename = "Half-Day-PM")]
    HalfDayPm,
    #[strum(to_string = "Absent", serialize = "absent")]
    #[serde(rename = "Absent")]
    Absent,
}

impl AttendanceStatus {
    /// Only complete half-day pairs count; a lone time-in with no matching
    /// time-out is Absent.
    pub fn of(day: &DtrDay) -> Self {
        let am_in = day.time_in_am.is_some();
        let am_out = day.time_out_am.is_some();
        let pm_in = day.time_in_pm.is_some();
        let pm_out = day.time_out_pm.is_some();

        match (am_in, am_out, pm_in, pm_out) {
            (true, true, true, true) => AttendanceStatus::Present,
            (true, true, false, false) => AttendanceStatus::HalfDayAm,
            (false, false, true, true) => AttendanceStatus::HalfDayPm,
            _ => AttendanceStatus::Absent,
        }
    }
}

/// Exclusive time-of-day bounds for a late morning arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LateWindow {
    pub after: NaiveTime,
    pub before: NaiveTime,
}

impl Default for LateWindow {
    fn default() -> Self {
        Self {
            after: NaiveTime::from_hms_opt(8, 1, 0).unwrap_or_default(),
            before: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default(),
        }
    }
}

impl LateWindow {
    pub fn is_late(&self, time_in_am: Option<NaiveTime>) -> bool {
        match time_in_am {
            Some(t) => t > self.after && t < self.before,
            None => false,
        }
    }

    /// String form used by callers holding raw scan values. Unparseable input
    /// is never late.
    pub fn is_late_str(&self, time_in_am: &str) -> bool {
        let parsed = NaiveTime::parse_from_str(time_in_am.trim(), "%H:%M:%S").ok();
        self.is_late(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, s)
    }

    fn day(am_in: bool, am_out: bool, pm_in: bool, pm_out: bool) -> DtrDay {
        DtrDay {
            time_in_am: am_in.then(|| t(8, 0, 0)).flatten(),
            time_out_am: am_out.then(|| t(12, 0, 0)).flatten(),
            time_in_pm: pm_in.then(|| t(13, 0, 0)).flatten(),
            time_out_pm: pm_out.then(|| t(17, 0, 0)).flatten(),
        }
    }

    #[test]
    fn classifies_complete_combinations() {
        assert_eq!(AttendanceStatus::of(&day(true, true, true, true)), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::of(&day(true, true, false, false)), AttendanceStatus::HalfDayAm);
        assert_eq!(AttendanceStatus::of(&day(false, false, true, true)), AttendanceStatus::HalfDayPm);
        assert_eq!(AttendanceStatus::of(&day(false, false, false, false)), AttendanceStatus::Absent);
    }

    #[test]
    fn partial_pairs_fall_through_to_absent() {
        assert_eq!(AttendanceStatus::of(&day(true, false, false, false)), AttendanceStatus::Absent);
        assert_eq!(AttendanceStatus::of(&day(true, true, true, false)), AttendanceStatus::Absent);
        assert_eq!(AttendanceStatus::of(&day(false, true, true, true)), AttendanceStatus::Absent);
    }

    #[test]
    fn late_bounds_are_exclusive() {
        let window = LateWindow::default();
        assert!(!window.is_late_str("08:00:59"));
        assert!(!window.is_late_str("08:01:00"));
        assert!(window.is_late_str("08:01:01"));
        assert!(window.is_late_str("11:59:59"));
        assert!(!window.is_late_str("12:00:00"));
    }

    #[test]
    fn unparseable_or_missing_is_not_late() {
        let window = LateWindow::default();
        assert!(!window.is_late_str(""));
        assert!(!window.is_late_str("nine o'clock"));
        assert!(!window.is_late(None));
    }

    #[test]
    fn status_names_round_trip() {
        assert_eq!(AttendanceStatus::HalfDayAm.to_string(), "Half-Day-AM");
        assert_eq!("half-day-pm".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::HalfDayPm);
        assert_eq!("full-day".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Present);
    }
}
