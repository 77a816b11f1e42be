use chrono::NaiveTime;

use super::DtrError;
use super::hms::{Hms, seconds_between};

/// Remove approved leave from a day's total. Never goes below `00:00:00`.
pub fn deduct_leave(day_total: Hms, leave: Hms) -> Hms {
    day_total - leave
}

/// Duration of a same-day leave: from leaving the site until returning.
pub fn leave_window(leave_at: NaiveTime, return_at: NaiveTime) -> Result<Hms, DtrError> {
    if return_at < leave_at {
        return Err(DtrError::ReturnBeforeLeave);
    }
    Ok(Hms::from_secs(seconds_between(leave_at, return_at)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtr::accumulate::RenderedHours;

    fn hms(s: &str) -> Hms {
        s.parse().unwrap()
    }

    #[test]
    fn deducts_leave_from_day() {
        assert_eq!(deduct_leave(hms("08:00:00"), hms("02:00:00")).to_string(), "06:00:00");
    }

    #[test]
    fn over_deduction_floors_at_zero() {
        assert_eq!(deduct_leave(hms("01:30:00"), hms("04:00:00")).to_string(), "00:00:00");
        assert_eq!(deduct_leave(Hms::ZERO, hms("00:00:01")), Hms::ZERO);
    }

    #[test]
    fn approval_scenario_recomputes_rendered_and_remaining() {
        // 472h across earlier days plus the 8h day that takes the leave.
        let earlier = hms("472:00:00");
        let day = hms("08:00:00");
        let before = RenderedHours::recompute(500, [earlier, day]);
        assert_eq!(before.rendered.to_string(), "480:00:00");

        let day = deduct_leave(day, hms("02:00:00"));
        assert_eq!(day.to_string(), "06:00:00");

        let after = RenderedHours::recompute(500, [earlier, day]);
        assert_eq!(after.rendered.to_string(), "478:00:00");
        assert_eq!(after.remaining.to_string(), "22:00:00");
    }

    #[test]
    fn leave_window_measures_absence() {
        let out = NaiveTime::from_hms_opt(10, 15, 0).unwrap();
        let back = NaiveTime::from_hms_opt(13, 45, 30).unwrap();
        assert_eq!(leave_window(out, back).unwrap().to_string(), "03:30:30");
        assert!(matches!(leave_window(back, out), Err(DtrError::ReturnBeforeLeave)));
    }
}
