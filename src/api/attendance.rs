use crate::{
    auth::auth::AuthUser,
    config::Config,
    dtr::{
        accumulate::RenderedHours,
        classify::{AttendanceStatus, LateWindow},
        hms::{Hms, parse_date_param},
        scan::DtrDay,
    },
    error::AppError,
    model::user::full_name,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

const WEEK_NAMES: [&str; 6] = [
    "first_week",
    "second_week",
    "third_week",
    "fourth_week",
    "fifth_week",
    "sixth_week",
];

const ATTENDANCE_SELECT: &str = r#"
    SELECT
        d.intern_id, i.custom_intern_id,
        u.first_name, u.middle_name, u.last_name, u.suffix_name,
        i.supervisor_id, i.handler_id, d.work_date,
        d.time_in_am, d.time_out_am, d.time_in_pm, d.time_out_pm,
        i.ojt_hours_required, i.ojt_seconds_rendered
    FROM dtr_entries d
    JOIN interns i ON i.id = d.intern_id
    JOIN users u ON u.id = i.user_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct AttendanceRow {
    intern_id: u64,
    custom_intern_id: Option<String>,
    first_name: String,
    middle_name: String,
    last_name: String,
    suffix_name: String,
    supervisor_id: Option<u64>,
    handler_id: Option<u64>,
    work_date: NaiveDate,
    time_in_am: Option<NaiveTime>,
    time_out_am: Option<NaiveTime>,
    time_in_pm: Option<NaiveTime>,
    time_out_pm: Option<NaiveTime>,
    ojt_hours_required: i32,
    ojt_seconds_rendered: i64,
}

impl AttendanceRow {
    fn day(&self) -> DtrDay {
        DtrDay {
            time_in_am: self.time_in_am,
            time_out_am: self.time_out_am,
            time_in_pm: self.time_in_pm,
            time_out_pm: self.time_out_pm,
        }
    }

    fn name(&self) -> String {
        full_name(
            &self.first_name,
            &self.middle_name,
            &self.last_name,
            &self.suffix_name,
        )
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceRecord {
    pub intern_id: u64,
    #[schema(example = "Intern-2025-007")]
    pub custom_intern_id: Option<String>,
    #[schema(example = "Juan S. Dela Cruz")]
    pub name: String,
    pub supervisor_id: Option<u64>,
    pub handler_id: Option<u64>,
    #[schema(value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub time_in_am: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub time_out_am: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub time_in_pm: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub time_out_pm: Option<NaiveTime>,
    pub status: AttendanceStatus,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        let status = AttendanceStatus::of(&row.day());
        let name = row.name();
        AttendanceRecord {
            intern_id: row.intern_id,
            custom_intern_id: row.custom_intern_id,
            name,
            supervisor_id: row.supervisor_id,
            handler_id: row.handler_id,
            work_date: row.work_date,
            time_in_am: row.time_in_am,
            time_out_am: row.time_out_am,
            time_in_pm: row.time_in_pm,
            time_out_pm: row.time_out_pm,
            status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceSummary {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub present: Vec<AttendanceRecord>,
    pub half_day_am: Vec<AttendanceRecord>,
    pub half_day_pm: Vec<AttendanceRecord>,
    pub absent: Vec<AttendanceRecord>,
    pub total_records: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InternHoursStatus {
    pub intern_id: u64,
    pub name: String,
    #[schema(value_type = String, example = "120:30:00")]
    pub ojt_hours_rendered: Hms,
    #[schema(value_type = String, example = "379:30:00")]
    pub remaining_hours: Hms,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LateCount {
    pub intern_id: u64,
    pub name: String,
    pub late_days: u32,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeekTally {
    pub absent: u32,
    pub always_late: u32,
    pub half_day_am: u32,
    pub half_day_pm: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeekAttendance {
    #[schema(example = "first_week")]
    pub week: String,
    #[schema(example = "2025-04-01 to 2025-04-04")]
    pub week_range: String,
    #[serde(flatten)]
    pub tally: WeekTally,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct SchoolCount {
    #[schema(example = "Polytechnic University")]
    pub school_name: String,
    #[schema(example = 12)]
    pub count: i64,
}

#[derive(Deserialize, IntoParams)]
pub struct MonthlyQuery {
    /// first_week .. sixth_week; every week when omitted
    pub week: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct SchoolQuery {
    /// Substring match on the school name
    pub school_name: Option<String>,
}

/// Which rows the status endpoint keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusFilter {
    Late,
    Status(AttendanceStatus),
}

impl StatusFilter {
    fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        if s == "late" {
            return Some(StatusFilter::Late);
        }
        s.parse().ok().map(StatusFilter::Status)
    }

    fn matches(self, day: &DtrDay, late: &LateWindow) -> bool {
        match self {
            StatusFilter::Late => late.is_late(day.time_in_am),
            StatusFilter::Status(status) => AttendanceStatus::of(day) == status,
        }
    }
}

/// Monday-to-Friday ranges of `year`/`month`, each clipped to the month.
pub fn month_week_ranges(year: i32, month: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let Some(last) = next_month.and_then(|d| d.pred_opt()) else {
        return Vec::new();
    };

    let mut monday = first - Duration::days(i64::from(first.weekday().num_days_from_monday()));
    let mut ranges = Vec::new();

    while monday <= last {
        let start = monday.max(first);
        let end = (monday + Duration::days(4)).min(last);
        if start <= end {
            ranges.push((start, end));
        }
        monday += Duration::days(7);
    }

    ranges
}

/// Monday and Sunday of the week holding `day`.
fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day.week(Weekday::Mon).first_day();
    (monday, monday + Duration::days(6))
}

fn tally<'a>(days: impl IntoIterator<Item = &'a DtrDay>, late: &LateWindow) -> WeekTally {
    let mut tally = WeekTally::default();
    for day in days {
        if late.is_late(day.time_in_am) {
            tally.always_late += 1;
        }
        match AttendanceStatus::of(day) {
            AttendanceStatus::HalfDayAm => tally.half_day_am += 1,
            AttendanceStatus::HalfDayPm => tally.half_day_pm += 1,
            AttendanceStatus::Absent => tally.absent += 1,
            AttendanceStatus::Present => {}
        }
    }
    tally
}

async fn rows_between(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AttendanceRow>, AppError> {
    let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
        "{ATTENDANCE_SELECT} WHERE d.work_date BETWEEN ? AND ? ORDER BY d.work_date, u.last_name"
    ))
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Attendance of every intern with a DTR row on one date, grouped by status
#[utoipa::path(
    get,
    path = "/api/attendance/summary/{date}",
    params(("date" = String, Path, description = "YYYY-MM-DD or MM-DD-YYYY")),
    responses(
        (status = 200, description = "Grouped attendance", body = AttendanceSummary),
        (status = 400, description = "Bad date"),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;
    let date = parse_date_param(&path).map_err(AppError::from)?;

    let rows = rows_between(pool.get_ref(), date, date).await?;

    let mut summary = AttendanceSummary {
        date,
        present: Vec::new(),
        half_day_am: Vec::new(),
        half_day_pm: Vec::new(),
        absent: Vec::new(),
        total_records: rows.len(),
    };

    for record in rows.into_iter().map(AttendanceRecord::from) {
        match record.status {
            AttendanceStatus::Present => summary.present.push(record),
            AttendanceStatus::HalfDayAm => summary.half_day_am.push(record),
            AttendanceStatus::HalfDayPm => summary.half_day_pm.push(record),
            AttendanceStatus::Absent => summary.absent.push(record),
        }
    }

    Ok(HttpResponse::Ok().json(summary))
}

/// Today's interns matching a status, with their rendered hours
#[utoipa::path(
    get,
    path = "/api/attendance/status/{status}",
    params(("status" = String, Path, description = "late, present, half-day-am, half-day-pm or absent")),
    responses(
        (status = 200, description = "Matching interns", body = Object, example = json!({
            "message": "Attendance status fetched successfully.",
            "total_of": 1,
            "data": [{"intern_id": 7, "name": "Juan S. Dela Cruz", "ojt_hours_rendered": "120:30:00", "remaining_hours": "379:30:00"}]
        })),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_by_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let filter = StatusFilter::parse(&path).ok_or_else(|| {
        AppError::validation(
            "Invalid status. Use one of: late, present, half-day-am, half-day-pm, absent.",
        )
    })?;

    let today = config.local_now().date_naive();
    let late = config.late_window();
    let rows = rows_between(pool.get_ref(), today, today).await?;

    let data: Vec<InternHoursStatus> = rows
        .iter()
        .filter(|row| filter.matches(&row.day(), &late))
        .map(|row| {
            let hours = RenderedHours::recompute(
                i64::from(row.ojt_hours_required),
                [Hms::from_secs(row.ojt_seconds_rendered)],
            );
            InternHoursStatus {
                intern_id: row.intern_id,
                name: row.name(),
                ojt_hours_rendered: hours.rendered,
                remaining_hours: hours.remaining,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance status fetched successfully.",
        "total_of": data.len(),
        "data": data
    })))
}

/// Late arrivals per intern for the current Monday-to-Sunday week
#[utoipa::path(
    get,
    path = "/api/attendance/weekly-late",
    responses(
        (status = 200, description = "Late counts", body = Object, example = json!({
            "message": "Weekly late interns fetched successfully.",
            "week_range": "2025-04-07 to 2025-04-13",
            "data": [{"intern_id": 7, "name": "Juan S. Dela Cruz", "late_days": 2}]
        })),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn weekly_late(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let (monday, sunday) = week_bounds(config.local_now().date_naive());
    let late = config.late_window();
    let rows = rows_between(pool.get_ref(), monday, sunday).await?;

    let mut counts: BTreeMap<u64, LateCount> = BTreeMap::new();
    for row in rows.iter().filter(|r| late.is_late(r.time_in_am)) {
        counts
            .entry(row.intern_id)
            .or_insert_with(|| LateCount {
                intern_id: row.intern_id,
                name: row.name(),
                late_days: 0,
            })
            .late_days += 1;
    }

    let data: Vec<LateCount> = counts.into_values().collect();
    let message = if data.is_empty() {
        "No interns were late this week."
    } else {
        "Weekly late interns fetched successfully."
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "week_range": format!("{monday} to {sunday}"),
        "total_of": data.len(),
        "data": data
    })))
}

/// Absences, late arrivals and half days per week of the current month
#[utoipa::path(
    get,
    path = "/api/attendance/monthly",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Per-week tallies", body = Object, example = json!({
            "message": "Weekly attendance fetched successfully.",
            "data": [{"week": "first_week", "week_range": "2025-04-01 to 2025-04-04", "absent": 1, "always_late": 2, "half_day_am": 0, "half_day_pm": 1}]
        })),
        (status = 400, description = "Unknown week"),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn monthly_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<MonthlyQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let today = config.local_now().date_naive();
    let ranges = month_week_ranges(today.year(), today.month());

    let selected: Vec<(usize, (NaiveDate, NaiveDate))> = match query.week.as_deref() {
        Some(week) => {
            let idx = WEEK_NAMES
                .iter()
                .position(|w| *w == week)
                .filter(|&i| i < ranges.len())
                .ok_or_else(|| AppError::validation("Invalid week parameter"))?;
            vec![(idx, ranges[idx])]
        }
        None => ranges.into_iter().enumerate().collect(),
    };

    let late = config.late_window();
    let mut data = Vec::with_capacity(selected.len());

    for (idx, (start, end)) in selected {
        let days: Vec<DtrDay> = rows_between(pool.get_ref(), start, end)
            .await?
            .iter()
            .map(AttendanceRow::day)
            .collect();

        data.push(WeekAttendance {
            week: WEEK_NAMES[idx].to_string(),
            week_range: format!("{start} to {end}"),
            tally: tally(&days, &late),
        });
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Weekly attendance fetched successfully.",
        "data": data
    })))
}

/// Number of interns per school
#[utoipa::path(
    get,
    path = "/api/analytics/school-count",
    params(SchoolQuery),
    responses(
        (status = 200, description = "Interns per school", body = Object, example = json!({
            "message": "School analytics fetched successfully.",
            "total_school": 1,
            "data": [{"school_name": "Polytechnic University", "count": 12}]
        })),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn school_count(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SchoolQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let pattern = query
        .school_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"));

    let results = sqlx::query_as::<_, SchoolCount>(
        r#"
        SELECT school_name, COUNT(*) AS count
        FROM interns
        WHERE (? IS NULL OR school_name LIKE ?)
        GROUP BY school_name
        ORDER BY count DESC, school_name
        "#,
    )
    .bind(pattern.as_deref())
    .bind(pattern.as_deref())
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to get school analytics");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "School analytics fetched successfully.",
        "total_school": results.len(),
        "data": results
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn april_2025_weeks_start_on_tuesday() {
        let weeks = month_week_ranges(2025, 4);
        assert_eq!(
            weeks,
            vec![
                (d(2025, 4, 1), d(2025, 4, 4)),
                (d(2025, 4, 7), d(2025, 4, 11)),
                (d(2025, 4, 14), d(2025, 4, 18)),
                (d(2025, 4, 21), d(2025, 4, 25)),
                (d(2025, 4, 28), d(2025, 4, 30)),
            ]
        );
    }

    #[test]
    fn weekend_start_skips_the_empty_week() {
        // March 2025 starts on a Saturday
        let weeks = month_week_ranges(2025, 3);
        assert_eq!(weeks.first(), Some(&(d(2025, 3, 3), d(2025, 3, 7))));
        assert_eq!(weeks.last(), Some(&(d(2025, 3, 31), d(2025, 3, 31))));
        assert_eq!(weeks.len(), 5);
        assert!(weeks.len() <= WEEK_NAMES.len());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let weeks = month_week_ranges(2025, 12);
        assert_eq!(weeks.last().map(|w| w.1), Some(d(2025, 12, 31)));
        assert!(month_week_ranges(2025, 13).is_empty());
    }

    #[test]
    fn week_bounds_run_monday_to_sunday() {
        assert_eq!(week_bounds(d(2025, 4, 9)), (d(2025, 4, 7), d(2025, 4, 13)));
        assert_eq!(week_bounds(d(2025, 4, 13)), (d(2025, 4, 7), d(2025, 4, 13)));
    }

    #[test]
    fn status_filter_accepts_legacy_names() {
        assert_eq!(StatusFilter::parse("late"), Some(StatusFilter::Late));
        assert_eq!(
            StatusFilter::parse("full-day"),
            Some(StatusFilter::Status(AttendanceStatus::Present))
        );
        assert_eq!(
            StatusFilter::parse("Half-Day-AM"),
            Some(StatusFilter::Status(AttendanceStatus::HalfDayAm))
        );
        assert_eq!(StatusFilter::parse("sleeping"), None);
    }

    #[test]
    fn tallies_a_week() {
        let late = LateWindow::default();
        let days = [
            DtrDay {
                time_in_am: t(8, 30),
                time_out_am: t(12, 0),
                time_in_pm: t(13, 0),
                time_out_pm: t(17, 0),
            },
            DtrDay {
                time_in_am: t(7, 55),
                time_out_am: t(12, 0),
                ..DtrDay::default()
            },
            DtrDay {
                time_in_pm: t(13, 0),
                time_out_pm: t(17, 0),
                ..DtrDay::default()
            },
            DtrDay::default(),
        ];
        assert_eq!(
            tally(&days, &late),
            WeekTally {
                absent: 1,
                always_late: 1,
                half_day_am: 1,
                half_day_pm: 1,
            }
        );
    }
}
