use serde::Serialize;
use utoipa::ToSchema;

use super::hms::Hms;

/// Rendered and remaining OJT hours for one intern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RenderedHours {
    #[schema(value_type = String, example = "478:00:00")]
    pub rendered: Hms,
    #[schema(value_type = String, example = "22:00:00")]
    pub remaining: Hms,
}

impl RenderedHours {
    /// Full recompute over every DTR total the intern has. No running counter
    /// is trusted, so callers pass all rows, not just the ones that changed.
    pub fn recompute<I>(required_hours: i64, day_totals: I) -> Self
    where
        I: IntoIterator<Item = Hms>,
    {
        let rendered: Hms = day_totals.into_iter().sum();
        let remaining = Hms::from_hours(required_hours) - rendered;
        Self { rendered, remaining }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(s: &str) -> Hms {
        s.parse().unwrap()
    }

    #[test]
    fn sums_every_day() {
        let days = ["08:00:00", "07:30:15", "04:29:45", "00:00:00"].map(hms);
        let hours = RenderedHours::recompute(500, days);
        assert_eq!(hours.rendered.to_string(), "20:00:00");
        assert_eq!(hours.remaining.to_string(), "480:00:00");
    }

    #[test]
    fn remaining_floors_at_zero() {
        let hours = RenderedHours::recompute(1, [hms("02:00:00")]);
        assert_eq!(hours.rendered.to_string(), "02:00:00");
        assert_eq!(hours.remaining, Hms::ZERO);
    }

    #[test]
    fn no_rows_means_nothing_rendered() {
        let hours = RenderedHours::recompute(300, Vec::new());
        assert_eq!(hours.rendered, Hms::ZERO);
        assert_eq!(hours.remaining.to_string(), "300:00:00");
    }
}
