use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::DtrError;
use super::hms::{Hms, seconds_between};

/// The four time slots of one intern's day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DtrDay {
    pub time_in_am: Option<NaiveTime>,
    pub time_out_am: Option<NaiveTime>,
    pub time_in_pm: Option<NaiveTime>,
    pub time_out_pm: Option<NaiveTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    TimeInAm,
    TimeOutAm,
    TimeInPm,
    TimeOutPm,
}

impl Slot {
    /// The column backing this slot in `dtr_entries`.
    pub fn column(self) -> &'static str {
        match self {
            Slot::TimeInAm => "time_in_am",
            Slot::TimeOutAm => "time_out_am",
            Slot::TimeInPm => "time_in_pm",
            Slot::TimeOutPm => "time_out_pm",
        }
    }

    pub fn is_time_out(self) -> bool {
        self.opening().is_some()
    }

    /// The time-in a time-out closes.
    fn opening(self) -> Option<Slot> {
        match self {
            Slot::TimeOutAm => Some(Slot::TimeInAm),
            Slot::TimeOutPm => Some(Slot::TimeInPm),
            Slot::TimeInAm | Slot::TimeInPm => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    In,
    Out,
}

impl DtrDay {
    pub fn get(&self, slot: Slot) -> Option<NaiveTime> {
        match slot {
            Slot::TimeInAm => self.time_in_am,
            Slot::TimeOutAm => self.time_out_am,
            Slot::TimeInPm => self.time_in_pm,
            Slot::TimeOutPm => self.time_out_pm,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<NaiveTime> {
        match slot {
            Slot::TimeInAm => &mut self.time_in_am,
            Slot::TimeOutAm => &mut self.time_out_am,
            Slot::TimeInPm => &mut self.time_in_pm,
            Slot::TimeOutPm => &mut self.time_out_pm,
        }
    }

    fn pair(start: Option<NaiveTime>, end: Option<NaiveTime>) -> i64 {
        match (start, end) {
            (Some(start), Some(end)) => seconds_between(start, end),
            _ => 0,
        }
    }

    /// Hours worked: the sum of the complete AM and PM pairs.
    pub fn worked(&self) -> Hms {
        Hms::from_secs(
            Self::pair(self.time_in_am, self.time_out_am)
                + Self::pair(self.time_in_pm, self.time_out_pm),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.time_in_am.is_none()
            && self.time_out_am.is_none()
            && self.time_in_pm.is_none()
            && self.time_out_pm.is_none()
    }
}

/// Resolves scan events to slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRules {
    /// Time-ins before this are morning, at or after it afternoon.
    pub am_pm_split: NaiveTime,
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            am_pm_split: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default(),
        }
    }
}

impl ScanRules {
    pub fn resolve(&self, day: &DtrDay, kind: ScanKind, at: NaiveTime) -> Result<Slot, DtrError> {
        match kind {
            ScanKind::In if at < self.am_pm_split => Ok(Slot::TimeInAm),
            ScanKind::In => Ok(Slot::TimeInPm),
            ScanKind::Out => {
                if day.time_in_pm.is_some() && day.time_out_pm.is_none() {
                    Ok(Slot::TimeOutPm)
                } else if day.time_in_am.is_some() && day.time_out_am.is_none() {
                    Ok(Slot::TimeOutAm)
                } else {
                    Err(DtrError::NoOpenSession)
                }
            }
        }
    }
}

/// Write one slot of the day. A slot that already holds a time is never
/// overwritten, and a time-out needs its time-in first.
pub fn record_scan(day: &mut DtrDay, slot: Slot, at: NaiveTime) -> Result<(), DtrError> {
    if day.get(slot).is_some() {
        return Err(DtrError::SlotTaken(slot));
    }
    if let Some(opening) = slot.opening() {
        if day.get(opening).is_none() {
            return Err(DtrError::MissingTimeIn(opening));
        }
    }
    *day.slot_mut(slot) = Some(at);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn time_in_resolves_by_split() {
        let rules = ScanRules::default();
        let day = DtrDay::default();
        assert_eq!(rules.resolve(&day, ScanKind::In, t(7, 55, 0)).unwrap(), Slot::TimeInAm);
        assert_eq!(rules.resolve(&day, ScanKind::In, t(11, 59, 59)).unwrap(), Slot::TimeInAm);
        assert_eq!(rules.resolve(&day, ScanKind::In, t(12, 0, 0)).unwrap(), Slot::TimeInPm);
    }

    #[test]
    fn time_out_closes_the_open_session() {
        let rules = ScanRules::default();
        let mut day = DtrDay::default();
        assert!(matches!(
            rules.resolve(&day, ScanKind::Out, t(12, 0, 0)),
            Err(DtrError::NoOpenSession)
        ));

        day.time_in_am = Some(t(8, 0, 0));
        assert_eq!(rules.resolve(&day, ScanKind::Out, t(12, 5, 0)).unwrap(), Slot::TimeOutAm);

        day.time_out_am = Some(t(12, 0, 0));
        day.time_in_pm = Some(t(13, 0, 0));
        assert_eq!(rules.resolve(&day, ScanKind::Out, t(17, 0, 0)).unwrap(), Slot::TimeOutPm);
    }

    #[test]
    fn second_am_time_in_is_rejected_but_pm_still_succeeds() {
        let mut day = DtrDay::default();
        record_scan(&mut day, Slot::TimeInAm, t(8, 0, 0)).unwrap();
        assert!(matches!(
            record_scan(&mut day, Slot::TimeInAm, t(8, 5, 0)),
            Err(DtrError::SlotTaken(Slot::TimeInAm))
        ));
        assert_eq!(day.time_in_am, Some(t(8, 0, 0)));

        record_scan(&mut day, Slot::TimeInPm, t(13, 0, 0)).unwrap();
        assert_eq!(day.time_in_pm, Some(t(13, 0, 0)));
    }

    #[test]
    fn time_out_requires_time_in() {
        let mut day = DtrDay::default();
        assert!(matches!(
            record_scan(&mut day, Slot::TimeOutPm, t(17, 0, 0)),
            Err(DtrError::MissingTimeIn(Slot::TimeInPm))
        ));
        assert!(day.is_empty());
    }

    #[test]
    fn full_day_walks_every_state() {
        let mut day = DtrDay::default();
        record_scan(&mut day, Slot::TimeInAm, t(8, 0, 0)).unwrap();
        assert_eq!(day.worked(), Hms::ZERO);
        record_scan(&mut day, Slot::TimeOutAm, t(12, 0, 0)).unwrap();
        assert_eq!(day.worked().to_string(), "04:00:00");
        record_scan(&mut day, Slot::TimeInPm, t(13, 0, 0)).unwrap();
        assert_eq!(day.worked().to_string(), "04:00:00");
        record_scan(&mut day, Slot::TimeOutPm, t(17, 30, 0)).unwrap();
        assert_eq!(day.worked().to_string(), "08:30:00");
    }

    #[test]
    fn worked_never_exceeds_span() {
        let day = DtrDay {
            time_in_am: Some(t(8, 0, 0)),
            time_out_am: Some(t(11, 0, 0)),
            time_in_pm: Some(t(13, 0, 0)),
            time_out_pm: Some(t(16, 0, 0)),
        };
        let span = seconds_between(t(8, 0, 0), t(16, 0, 0));
        assert!(day.worked().as_secs() <= span);
    }

    #[test]
    fn slot_names_parse_from_paths() {
        assert_eq!("time_out_am".parse::<Slot>().unwrap(), Slot::TimeOutAm);
        assert_eq!(Slot::TimeInPm.to_string(), "time_in_pm");
        assert!("lunch".parse::<Slot>().is_err());
    }
}
