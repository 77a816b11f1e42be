use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::dtr::accumulate::RenderedHours;
use crate::dtr::hms::Hms;
use crate::model::user::full_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize, Deserialize, ToSchema)]
#[strum(ascii_case_insensitive)]
pub enum InternStatus {
    Pending,
    Approved,
    Archived,
}

/// Columns every intern query selects, joined with the owning user.
pub const INTERN_SELECT: &str = r#"
    SELECT
        i.id, i.user_id, i.custom_intern_id,
        u.first_name, u.middle_name, u.last_name, u.suffix_name, u.email,
        i.student_id, i.school_name, i.course, i.address,
        i.supervisor_id, i.handler_id,
        i.ojt_hours_required, i.ojt_seconds_rendered,
        i.status, i.created_at
    FROM interns i
    JOIN users u ON u.id = i.user_id
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InternRecord {
    pub id: u64,
    pub user_id: u64,
    pub custom_intern_id: Option<String>,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub suffix_name: String,
    pub email: String,
    pub student_id: String,
    pub school_name: String,
    pub course: String,
    pub address: String,
    pub supervisor_id: Option<u64>,
    pub handler_id: Option<u64>,
    pub ojt_hours_required: i32,
    pub ojt_seconds_rendered: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 7,
    "user_id": 12,
    "custom_intern_id": "Intern-2025-007",
    "name": "Juan S. Dela Cruz",
    "email": "juan@school.edu.ph",
    "student_id": "2021-00123",
    "school_name": "Polytechnic University",
    "course": "BSIT",
    "address": "Quezon City",
    "supervisor_id": 2,
    "handler_id": null,
    "ojt_hours_required": 500,
    "ojt_hours_rendered": "478:00:00",
    "remaining_hours": "22:00:00",
    "status": "Approved",
    "created_at": "2025-04-01T00:00:00Z"
}))]
pub struct Intern {
    pub id: u64,
    pub user_id: u64,
    pub custom_intern_id: Option<String>,
    pub name: String,
    pub email: String,
    pub student_id: String,
    pub school_name: String,
    pub course: String,
    pub address: String,
    pub supervisor_id: Option<u64>,
    pub handler_id: Option<u64>,
    pub ojt_hours_required: i32,
    #[schema(value_type = String)]
    pub ojt_hours_rendered: Hms,
    #[schema(value_type = String)]
    pub remaining_hours: Hms,
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl InternRecord {
    pub fn name(&self) -> String {
        full_name(
            &self.first_name,
            &self.middle_name,
            &self.last_name,
            &self.suffix_name,
        )
    }

    /// Hours as last persisted on the intern row.
    pub fn stored_hours(&self) -> RenderedHours {
        RenderedHours::recompute(
            i64::from(self.ojt_hours_required),
            [Hms::from_secs(self.ojt_seconds_rendered)],
        )
    }
}

impl From<InternRecord> for Intern {
    fn from(r: InternRecord) -> Self {
        let hours = r.stored_hours();
        let name = r.name();
        Intern {
            id: r.id,
            user_id: r.user_id,
            custom_intern_id: r.custom_intern_id,
            name,
            email: r.email,
            student_id: r.student_id,
            school_name: r.school_name,
            course: r.course,
            address: r.address,
            supervisor_id: r.supervisor_id,
            handler_id: r.handler_id,
            ojt_hours_required: r.ojt_hours_required,
            ojt_hours_rendered: hours.rendered,
            remaining_hours: hours.remaining,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

/// Next `Intern-<year>-<seq>` id, one past the highest sequence already
/// issued this year. Ids from other years or with a malformed tail are ignored.
pub fn next_custom_intern_id<'a, I>(year: i32, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = format!("Intern-{year}-");
    let last = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(&prefix))
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    format!("{prefix}{:03}", last + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_id_of_the_year_starts_at_one() {
        assert_eq!(next_custom_intern_id(2025, Vec::<&str>::new()), "Intern-2025-001");
        assert_eq!(next_custom_intern_id(2026, ["Intern-2025-014"]), "Intern-2026-001");
    }

    #[test]
    fn increments_numerically_not_lexically() {
        let existing = ["Intern-2025-009", "Intern-2025-999", "Intern-2025-1000", "Intern-2025-abc"];
        assert_eq!(next_custom_intern_id(2025, existing), "Intern-2025-1001");
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("approved".parse::<InternStatus>().unwrap(), InternStatus::Approved);
        assert_eq!(InternStatus::Archived.as_ref(), "Archived");
        assert!("graduated".parse::<InternStatus>().is_err());
    }
}
