use crate::api::attendance::{
    AttendanceRecord, AttendanceSummary, InternHoursStatus, LateCount, SchoolCount,
    WeekAttendance, WeekTally,
};
use crate::api::intern::{FcmTokenReq, InternFilter, InternIds, InternListResponse};
use crate::api::leave_request::{
    CreateLeave, ExcuseLetter, LeaveFilter, LeaveListResponse, SameDayLeave,
};
use crate::api::scanner::{
    BatchFailure, BatchReq, BatchResponse, DtrFilter, DtrListResponse, ScanReq,
};
use crate::api::supervisor::{SupervisorFilter, SupervisorListResponse};
use crate::api::user::{CreateHandlerProfile, CreateInternProfile, CreateSupervisorProfile};
use crate::auth::handlers::{ChangePasswordReq, LoginResponse, RegisterInternReq};
use crate::auth::reset::{ForgotPasswordReq, ResetPasswordReq, VerifyCodeReq};
use crate::dtr::accumulate::RenderedHours;
use crate::dtr::classify::AttendanceStatus;
use crate::dtr::scan::{ScanKind, Slot};
use crate::model::dtr_entry::DtrEntryView;
use crate::model::intern::{Intern, InternStatus};
use crate::model::leave_request::{LeaveResponse, LeaveStatus};
use crate::model::supervisor::{Handler, ProfileStatus, Supervisor};
use crate::models::{LoginReqDto, UserReq};
use crate::utils::dtr_store::ScanOutcome;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "InternTrack API",
        version = "1.0.0",
        description = r#"
## Internship Tracking System

Tracks OJT interns through their internship: registration and approval,
daily time records, leave, and the rendered hours counting toward the
required total.

### Key Features
- **Interns**
  - Self-registration, approval with `Intern-<year>-<seq>` ids, archiving
- **Daily Time Record**
  - QR scans filling the four AM/PM slots, batch time-in/out
- **Leave**
  - Dated and same-day requests, deducted from the day on approval
- **Attendance analytics**
  - Daily summary, status filters, weekly late counts, monthly breakdown

### Security
Everything under `/api` needs a **JWT Bearer** access token.
Durations are `HH:MM:SS` strings, hours may exceed 24.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::register_intern,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::create_user,
        crate::auth::handlers::change_password,
        crate::auth::reset::forgot_password,
        crate::auth::reset::verify_code,
        crate::auth::reset::reset_password,

        crate::api::user::create_intern_profile,
        crate::api::user::create_supervisor_profile,
        crate::api::user::create_handler_profile,

        crate::api::intern::list_interns,
        crate::api::intern::get_intern,
        crate::api::intern::update_intern,
        crate::api::intern::approve_interns,
        crate::api::intern::archive_interns,
        crate::api::intern::intern_hours,
        crate::api::intern::recalculate_hours,
        crate::api::intern::update_fcm_token,

        crate::api::supervisor::list_supervisors,
        crate::api::supervisor::get_supervisor,
        crate::api::supervisor::update_supervisor,
        crate::api::supervisor::archive_supervisor,
        crate::api::supervisor::update_handler,

        crate::api::scanner::scan,
        crate::api::scanner::set_slot,
        crate::api::scanner::default_time_in,
        crate::api::scanner::list_dtr,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::create_same_day_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::view_excuse_letter,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::attendance::attendance_summary,
        crate::api::attendance::attendance_by_status,
        crate::api::attendance::weekly_late,
        crate::api::attendance::monthly_attendance,
        crate::api::attendance::school_count
    ),
    components(
        schemas(
            UserReq,
            LoginReqDto,
            LoginResponse,
            RegisterInternReq,
            ChangePasswordReq,
            ForgotPasswordReq,
            VerifyCodeReq,
            ResetPasswordReq,
            CreateInternProfile,
            CreateSupervisorProfile,
            CreateHandlerProfile,
            Intern,
            InternStatus,
            InternFilter,
            InternListResponse,
            InternIds,
            FcmTokenReq,
            RenderedHours,
            Supervisor,
            Handler,
            ProfileStatus,
            SupervisorFilter,
            SupervisorListResponse,
            ScanReq,
            ScanKind,
            Slot,
            ScanOutcome,
            BatchReq,
            BatchFailure,
            BatchResponse,
            DtrFilter,
            DtrEntryView,
            DtrListResponse,
            AttendanceStatus,
            ExcuseLetter,
            CreateLeave,
            SameDayLeave,
            LeaveStatus,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            AttendanceRecord,
            AttendanceSummary,
            InternHoursStatus,
            LateCount,
            WeekTally,
            WeekAttendance,
            SchoolCount
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, tokens and password recovery"),
        (name = "Users", description = "User accounts and role profiles"),
        (name = "Interns", description = "Intern management APIs"),
        (name = "Supervisors", description = "Supervisor and handler APIs"),
        (name = "DTR", description = "Daily time record APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance analytics APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_bearer_scheme_and_routes() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/api/dtr/scan"));
        assert!(doc.paths.paths.contains_key("/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/leave/{leave_id}/excuse-letter"));
    }
}
