use crate::{
    api::{FilterValue, paginate},
    auth::auth::AuthUser,
    config::Config,
    dtr::{
        hms::{Hms, parse_date_param, parse_time_of_day},
        leave::{deduct_leave, leave_window},
    },
    error::{AppError, AppResult},
    model::{
        dtr_entry::DtrEntry,
        leave_request::{LEAVE_SELECT, LeaveRequest, LeaveResponse, LeaveStatus},
    },
    utils::{
        dtr_store::{fetch_day, lock_intern, recompute_rendered},
        notify::{Notifier, notify_intern},
    },
};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, web};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

const EXCUSE_EXTENSIONS: &[&str] = &["pdf", "docx", "jpg", "jpeg", "png"];
const MAX_EXCUSE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Deserialize, ToSchema)]
pub struct ExcuseLetter {
    #[schema(example = "medical-certificate.pdf")]
    pub file_name: String,
    /// File content, standard base64
    pub content_base64: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    /// Staff file for any intern; interns may omit it
    #[schema(example = 7)]
    pub intern_id: Option<u64>,
    /// YYYY-MM-DD or MM-DD-YYYY
    #[schema(example = "2025-04-07")]
    pub leave_date: String,
    #[schema(example = "Medical check-up")]
    pub reason: String,
    /// Hours to deduct on approval; a full day when omitted
    #[schema(example = "02:00:00", value_type = Option<String>)]
    pub leave_hours: Option<Hms>,
    pub excuse_letter: Option<ExcuseLetter>,
}

#[derive(Deserialize, ToSchema)]
pub struct SameDayLeave {
    #[schema(example = 7)]
    pub intern_id: Option<u64>,
    /// When the intern left the site
    #[schema(example = "10:15:00")]
    pub leave_request_time: String,
    /// When the intern is back
    #[schema(example = "13:45:00")]
    pub return_in_ojt: String,
    #[schema(example = "Family emergency")]
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 7)]
    /// Filter by intern ID
    pub intern_id: Option<u64>,
    #[schema(example = "Pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Drops any client-side directory part of an uploaded file name.
fn base_file_name(file_name: &str) -> &str {
    file_name
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(file_name)
        .trim()
}

fn excuse_content_type(file_name: &str) -> &'static str {
    match extension(file_name).as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Checks the extension and that the content really is base64.
fn validate_excuse_letter(letter: &ExcuseLetter) -> AppResult<()> {
    let ext = extension(&letter.file_name);

    if !EXCUSE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::validation(
            "Invalid file format. Only PDF, DOCX, JPG, and PNG allowed.",
        ));
    }

    let bytes = STANDARD
        .decode(letter.content_base64.trim())
        .map_err(|_| AppError::validation("Excuse letter is not valid base64"))?;

    if bytes.is_empty() {
        return Err(AppError::validation("Excuse letter is empty"));
    }
    if bytes.len() > MAX_EXCUSE_BYTES {
        return Err(AppError::validation("Excuse letter exceeds 5 MB"));
    }
    Ok(())
}

/// A leave can only be approved against an existing DTR row for its date.
fn require_dtr(entry: Option<DtrEntry>, leave_date: NaiveDate) -> AppResult<DtrEntry> {
    entry.ok_or_else(|| AppError::not_found(format!("DTR not found for {leave_date}")))
}

/// Interns file for themselves; staff must name the intern.
fn target_intern(auth: &AuthUser, requested: Option<u64>) -> actix_web::Result<u64> {
    let intern_id = match (auth.is_intern(), requested) {
        (true, _) => auth
            .intern_id
            .ok_or_else(|| AppError::forbidden("No intern profile"))?,
        (false, Some(id)) => id,
        (false, None) => return Err(AppError::validation("intern_id is required").into()),
    };
    auth.require_intern_access(intern_id)?;
    if requested.is_some_and(|id| id != intern_id) {
        return Err(actix_web::error::ErrorForbidden("Not allowed to access this intern"));
    }
    Ok(intern_id)
}

async fn insert_leave(
    pool: &MySqlPool,
    intern_id: u64,
    leave_date: NaiveDate,
    reason: &str,
    excuse_letter: Option<&ExcuseLetter>,
    leave: Hms,
) -> AppResult<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (intern_id, leave_date, reason, excuse_letter, excuse_letter_name, leave_seconds)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(intern_id)
    .bind(leave_date)
    .bind(reason)
    .bind(excuse_letter.map(|l| l.content_base64.trim()))
    .bind(excuse_letter.map(|l| base_file_name(&l.file_name)))
    .bind(leave.as_secs())
    .execute(pool)
    .await
    .map_err(|e| {
        let constraint = matches!(&e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23000"));
        if constraint {
            AppError::not_found("Intern not found")
        } else {
            AppError::Database(e)
        }
    })?;

    Ok(result.last_insert_id())
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "id": 1,
            "status": "Pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let intern_id = target_intern(&auth, payload.intern_id)?;

    // 1️⃣ validate fields
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("Reason is required").into());
    }
    let leave_date = parse_date_param(&payload.leave_date).map_err(AppError::from)?;
    let leave = payload.leave_hours.unwrap_or(config.full_day_leave);
    if leave == Hms::ZERO {
        return Err(AppError::validation("Leave hours must be greater than zero").into());
    }

    // 2️⃣ validate attachment
    if let Some(letter) = &payload.excuse_letter {
        validate_excuse_letter(letter)?;
    }
    // 3️⃣ insert request
    let id = insert_leave(
        pool.get_ref(),
        intern_id,
        leave_date,
        reason,
        payload.excuse_letter.as_ref(),
        leave,
    )
    .await?;

    info!(leave_id = id, intern_id, %leave_date, "Leave request filed");

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted",
        "id": id,
        "status": "Pending"
    })))
}

/* =========================
Same-day leave window
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/same-day",
    request_body = SameDayLeave,
    responses(
        (status = 201, description = "Leave recorded, pending approval", body = Object, example = json!({
            "message": "Leave request recorded successfully (pending approval)",
            "id": 2,
            "leave_hours": "03:30:00",
            "leave_date": "2025-04-07"
        })),
        (status = 400, description = "Bad time or return before leave"),
        (status = 404, description = "DTR entry not found for today")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_same_day_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<SameDayLeave>,
) -> actix_web::Result<impl Responder> {
    let intern_id = target_intern(&auth, payload.intern_id)?;

    let leave_at = parse_time_of_day(&payload.leave_request_time).map_err(AppError::from)?;
    let return_at = parse_time_of_day(&payload.return_in_ojt).map_err(AppError::from)?;
    let leave = leave_window(leave_at, return_at).map_err(AppError::from)?;

    let today = config.local_now().date_naive();

    let has_dtr = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM dtr_entries WHERE intern_id = ? AND work_date = ?)",
    )
    .bind(intern_id)
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    if !has_dtr {
        return Err(AppError::not_found("DTR entry not found for today").into());
    }

    let id = insert_leave(pool.get_ref(), intern_id, today, payload.reason.trim(), None, leave).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request recorded successfully (pending approval)",
        "id": id,
        "leave_hours": leave,
        "leave_date": today
    })))
}

/* =========================
Approve leave (staff)
========================= */
/// Deducts the leave from that day's DTR total and recomputes the intern's hours
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave request approved and total hours updated.",
            "day_total": "06:00:00",
            "rendered": {"rendered": "478:00:00", "remaining": "22:00:00"}
        })),
        (status = 404, description = "Leave request or DTR row not found"),
        (status = 409, description = "Leave request status is not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;
    let leave_id = path.into_inner();

    let intern_id = sqlx::query_scalar::<_, u64>("SELECT intern_id FROM leave_requests WHERE id = ?")
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;

    // intern first, the same order scans take
    let intern = lock_intern(&mut tx, intern_id).await?;

    let leave = sqlx::query_as::<_, LeaveRequest>(&format!("{LEAVE_SELECT} WHERE id = ? FOR UPDATE"))
        .bind(leave_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    leave.ensure_pending()?;

    let day = fetch_day(&mut tx, intern_id, leave.leave_date).await?;
    let entry = require_dtr(day, leave.leave_date)?;

    let day_total = deduct_leave(entry.total(), Hms::from_secs(leave.leave_seconds));

    sqlx::query("UPDATE dtr_entries SET total_seconds = ? WHERE id = ?")
        .bind(day_total.as_secs())
        .bind(entry.id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

    sqlx::query("UPDATE leave_requests SET status = 'Approved' WHERE id = ?")
        .bind(leave_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

    let rendered = recompute_rendered(&mut tx, &intern).await?;

    tx.commit().await.map_err(AppError::from)?;

    info!(leave_id, intern_id, %day_total, rendered = %rendered.rendered, "Leave approved");

    notify_intern(
        pool.get_ref(),
        notifier.get_ref(),
        intern_id,
        "Leave Request Approved",
        &format!("Your leave on {} has been approved.", leave.leave_date),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request approved and total hours updated.",
        "day_total": day_total,
        "rendered": rendered
    })))
}

/* =========================
Reject leave (staff)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<dyn Notifier>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'Rejected'
        WHERE id = ?
        AND status = 'Pending'
        "#,
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Reject leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    if let Ok(Some(intern_id)) =
        sqlx::query_scalar::<_, u64>("SELECT intern_id FROM leave_requests WHERE id = ?")
            .bind(leave_id)
            .fetch_optional(pool.get_ref())
            .await
    {
        notify_intern(
            pool.get_ref(),
            notifier.get_ref(),
            intern_id,
            "Leave Request Rejected",
            "Your leave request has been rejected.",
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave rejected"
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(&format!("{LEAVE_SELECT} WHERE id = ?"))
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match leave {
        Some(data) => {
            auth.require_intern_access(data.intern_id)?;
            Ok(HttpResponse::Ok().json(LeaveResponse::from(data)))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Leave request not found"
        }))),
    }
}

/// Download the excuse letter attached to a leave request
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}/excuse-letter",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "The attached file, served inline", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request or excuse letter not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn view_excuse_letter(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(&format!("{LEAVE_SELECT} WHERE id = ?"))
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    auth.require_intern_access(leave.intern_id)?;

    let content = leave
        .excuse_letter
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::not_found("No excuse letter attached"))?;

    let bytes = STANDARD.decode(content).map_err(|e| {
        AppError::Internal(format!("stored excuse letter {leave_id} is not base64: {e}"))
    })?;

    let file_name = leave
        .excuse_letter_name
        .unwrap_or_else(|| format!("excuse-letter-{leave_id}"));

    Ok(HttpResponse::Ok()
        .content_type(excuse_content_type(&file_name))
        .insert_header(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(file_name)],
        })
        .body(bytes))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // Interns only list their own requests
    let intern_id = if auth.is_intern() {
        Some(target_intern(&auth, query.intern_id)?)
    } else {
        query.intern_id
    };

    // -------------------------
    // Pagination
    // -------------------------
    let (page, per_page, offset) = paginate(query.page, query.per_page);

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(id) = intern_id {
        where_sql.push_str(" AND intern_id = ?");
        args.push(FilterValue::U64(id));
    }

    if let Some(status) = query.status.as_deref() {
        let status: LeaveStatus = status
            .parse()
            .map_err(|_| AppError::validation("Unknown leave status"))?;
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.as_ref().to_string()));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.as_str()),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "{LEAVE_SELECT}{where_sql} ORDER BY created_at DESC LIMIT ? OFFSET ?"
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = LeaveListResponse {
        data: leaves.into_iter().map(LeaveResponse::from).collect(),
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    fn letter(name: &str, content: &str) -> ExcuseLetter {
        ExcuseLetter {
            file_name: name.into(),
            content_base64: content.into(),
        }
    }

    #[test]
    fn excuse_letters_are_checked() {
        let pdf = STANDARD.encode(b"%PDF-1.4 test");
        assert!(validate_excuse_letter(&letter("note.PDF", &pdf)).is_ok());
        assert!(validate_excuse_letter(&letter("scan.jpeg", &pdf)).is_ok());
        assert!(validate_excuse_letter(&letter("run.exe", &pdf)).is_err());
        assert!(validate_excuse_letter(&letter("noextension", &pdf)).is_err());
        assert!(validate_excuse_letter(&letter("note.pdf", "not base64!!")).is_err());
        assert!(validate_excuse_letter(&letter("note.pdf", "")).is_err());
    }

    #[test]
    fn excuse_file_names_and_types() {
        assert_eq!(base_file_name("C:\\Users\\juan\\note.pdf"), "note.pdf");
        assert_eq!(base_file_name("../../etc/scan.png"), "scan.png");
        assert_eq!(base_file_name("plain.docx"), "plain.docx");

        assert_eq!(excuse_content_type("note.PDF"), "application/pdf");
        assert_eq!(excuse_content_type("scan.jpg"), "image/jpeg");
        assert_eq!(excuse_content_type("scan.jpeg"), "image/jpeg");
        assert_eq!(excuse_content_type("scan.png"), "image/png");
        assert!(excuse_content_type("cv.docx").contains("wordprocessingml"));
        assert_eq!(excuse_content_type("excuse-letter-3"), "application/octet-stream");
    }

    #[test]
    fn approval_without_dtr_row_is_not_found() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 4, 7).unwrap();
        let err = require_dtr(None, date).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "DTR not found for 2025-04-07");
    }

    #[test]
    fn approval_of_processed_leave_is_a_conflict() {
        let processed = LeaveRequest {
            id: 3,
            intern_id: 7,
            leave_date: chrono::NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(),
            reason: "Clinic".into(),
            excuse_letter: None,
            excuse_letter_name: None,
            leave_seconds: 7200,
            status: LeaveStatus::Approved.to_string(),
            created_at: chrono::Utc::now(),
        };
        let err = processed.ensure_pending().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn interns_file_only_for_themselves() {
        let intern = AuthUser {
            user_id: 12,
            email: "juan@school.edu.ph".into(),
            role: Role::Intern,
            intern_id: Some(7),
        };
        assert_eq!(target_intern(&intern, None).unwrap(), 7);
        assert_eq!(target_intern(&intern, Some(7)).unwrap(), 7);
        assert!(target_intern(&intern, Some(8)).is_err());

        let handler = AuthUser {
            role: Role::Handler,
            intern_id: None,
            ..intern
        };
        assert_eq!(target_intern(&handler, Some(8)).unwrap(), 8);
        assert!(target_intern(&handler, None).is_err());
    }

    #[test]
    fn leave_hours_parse_from_json() {
        let req: CreateLeave = serde_json::from_value(json!({
            "leave_date": "04-07-2025",
            "reason": "Clinic",
            "leave_hours": "02:00:00"
        }))
        .unwrap();
        assert_eq!(req.leave_hours, Some(Hms::from_hours(2)));
        assert_eq!(
            parse_date_param(&req.leave_date).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2025, 4, 7).unwrap()
        );
    }
}
