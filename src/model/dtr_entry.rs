use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::dtr::classify::AttendanceStatus;
use crate::dtr::hms::Hms;
use crate::dtr::scan::DtrDay;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DtrEntry {
    pub id: u64,
    pub intern_id: u64,
    pub supervisor_id: Option<u64>,
    pub work_date: NaiveDate,
    pub time_in_am: Option<NaiveTime>,
    pub time_out_am: Option<NaiveTime>,
    pub time_in_pm: Option<NaiveTime>,
    pub time_out_pm: Option<NaiveTime>,
    pub total_seconds: i64,
    pub created_at: DateTime<Utc>,
}

pub const DTR_SELECT: &str = r#"
    SELECT id, intern_id, supervisor_id, work_date,
           time_in_am, time_out_am, time_in_pm, time_out_pm,
           total_seconds, created_at
    FROM dtr_entries
"#;

impl DtrEntry {
    pub fn day(&self) -> DtrDay {
        DtrDay {
            time_in_am: self.time_in_am,
            time_out_am: self.time_out_am,
            time_in_pm: self.time_in_pm,
            time_out_pm: self.time_out_pm,
        }
    }

    pub fn total(&self) -> Hms {
        Hms::from_secs(self.total_seconds)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 31,
    "intern_id": 7,
    "work_date": "2025-04-07",
    "time_in_am": "08:00:00",
    "time_out_am": "12:00:00",
    "time_in_pm": "13:00:00",
    "time_out_pm": "17:00:00",
    "total_hours": "08:00:00",
    "status": "Present"
}))]
pub struct DtrEntryView {
    pub id: u64,
    pub intern_id: u64,
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
    #[schema(value_type = String)]
    pub total_hours: Hms,
    pub status: AttendanceStatus,
}

impl From<DtrEntry> for DtrEntryView {
    fn from(e: DtrEntry) -> Self {
        let status = AttendanceStatus::of(&e.day());
        let total_hours = e.total();
        DtrEntryView {
            id: e.id,
            intern_id: e.intern_id,
            work_date: e.work_date,
            time_in_am: e.time_in_am,
            time_out_am: e.time_out_am,
            time_in_pm: e.time_in_pm,
            time_out_pm: e.time_out_pm,
            total_hours,
            status,
        }
    }
}
