use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::dtr::hms::Hms;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize, Deserialize, ToSchema)]
#[strum(ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub intern_id: u64,
    pub leave_date: NaiveDate,
    pub reason: String,
    /// Base64 file content
    pub excuse_letter: Option<String>,
    pub excuse_letter_name: Option<String>,
    pub leave_seconds: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub const LEAVE_SELECT: &str = r#"
    SELECT id, intern_id, leave_date, reason, excuse_letter, excuse_letter_name,
           leave_seconds, status, created_at
    FROM leave_requests
"#;

impl LeaveRequest {
    pub fn status(&self) -> Option<LeaveStatus> {
        self.status.parse().ok()
    }

    /// Only a Pending request may be approved; approving twice is a conflict.
    pub fn ensure_pending(&self) -> AppResult<()> {
        match self.status() {
            Some(LeaveStatus::Pending) => Ok(()),
            _ => Err(AppError::conflict("Leave request status is not pending")),
        }
    }

    pub fn has_excuse_letter(&self) -> bool {
        self.excuse_letter.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    /// leave request id
    pub id: u64,
    /// intern the leave is filed for
    #[schema(example = 7)]
    pub intern_id: u64,
    #[schema(example = "2025-04-07", format = "date", value_type = String)]
    pub leave_date: NaiveDate,
    #[schema(example = "Medical check-up")]
    pub reason: String,
    /// whether an excuse letter was attached
    pub has_excuse_letter: bool,
    #[schema(example = "medical-certificate.pdf")]
    pub excuse_letter_name: Option<String>,
    #[schema(example = "02:00:00", value_type = String)]
    pub leave_hours: Hms,
    #[schema(example = "Pending")]
    pub status: String,
    #[schema(example = "2025-04-07T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<LeaveRequest> for LeaveResponse {
    fn from(l: LeaveRequest) -> Self {
        let has_excuse_letter = l.has_excuse_letter();
        LeaveResponse {
            id: l.id,
            intern_id: l.intern_id,
            leave_date: l.leave_date,
            reason: l.reason,
            has_excuse_letter,
            excuse_letter_name: l.excuse_letter_name.filter(|_| has_excuse_letter),
            leave_hours: Hms::from_secs(l.leave_seconds),
            status: l.status,
            created_at: l.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    fn leave(status: &str) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            intern_id: 7,
            leave_date: NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(),
            reason: "Clinic".into(),
            excuse_letter: None,
            excuse_letter_name: None,
            leave_seconds: 7200,
            status: status.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn only_pending_requests_can_be_approved() {
        assert!(leave("Pending").ensure_pending().is_ok());
        assert!(leave("pending").ensure_pending().is_ok());

        for status in ["Approved", "Rejected", "", "Cancelled"] {
            let err = leave(status).ensure_pending().unwrap_err();
            assert_eq!(err.status_code(), StatusCode::CONFLICT, "{status:?}");
        }
    }

    #[test]
    fn response_hides_name_without_letter() {
        let mut with_name = leave("Pending");
        with_name.excuse_letter_name = Some("note.pdf".into());
        let resp = LeaveResponse::from(with_name.clone());
        assert!(!resp.has_excuse_letter);
        assert_eq!(resp.excuse_letter_name, None);

        with_name.excuse_letter = Some("JVBERi0=".into());
        let resp = LeaveResponse::from(with_name);
        assert!(resp.has_excuse_letter);
        assert_eq!(resp.excuse_letter_name.as_deref(), Some("note.pdf"));
        assert_eq!(resp.leave_hours, Hms::from_hours(2));
    }
}
