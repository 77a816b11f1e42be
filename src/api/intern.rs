use crate::{
    api::{FilterValue, paginate},
    auth::auth::AuthUser,
    config::Config,
    dtr::accumulate::RenderedHours,
    error::{AppError, AppResult},
    model::intern::{INTERN_SELECT, Intern, InternRecord, InternStatus, next_custom_intern_id},
    utils::{
        db_utils::update_profile,
        dtr_store,
        notify::{Notifier, notify_intern},
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

/// Intern columns staff may edit.
const STAFF_EDITABLE: &[&str] = &[
    "student_id",
    "school_name",
    "course",
    "address",
    "supervisor_id",
    "handler_id",
    "ojt_hours_required",
];

/// Intern columns an intern may edit on its own profile.
const SELF_EDITABLE: &[&str] = &["student_id", "school_name", "course", "address"];

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct InternFilter {
    #[schema(example = "Approved")]
    /// Pending, Approved or Archived
    pub status: Option<String>,
    pub supervisor_id: Option<u64>,
    pub handler_id: Option<u64>,
    /// Matches name, email, school or custom intern id
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct InternListResponse {
    pub data: Vec<Intern>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct InternIds {
    #[schema(example = json!([7, 8]))]
    pub ids: Vec<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct FcmTokenReq {
    pub fcm_token: String,
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn validate_ids(ids: &[u64]) -> AppResult<()> {
    if ids.is_empty() {
        return Err(AppError::validation("ids must not be empty"));
    }
    if ids.len() > 500 {
        return Err(AppError::validation("At most 500 ids per request"));
    }
    Ok(())
}

pub(crate) async fn fetch_intern(pool: &MySqlPool, intern_id: u64) -> AppResult<InternRecord> {
    sqlx::query_as::<_, InternRecord>(&format!("{INTERN_SELECT} WHERE i.id = ?"))
        .bind(intern_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Intern not found"))
}

#[utoipa::path(
    get,
    path = "/api/interns",
    params(InternFilter),
    responses(
        (status = 200, description = "Paginated intern list", body = InternListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Interns"
)]
pub async fn list_interns(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<InternFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let (page, per_page, offset) = paginate(query.page, query.per_page);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(status) = query.status.as_deref() {
        let status: InternStatus = status
            .parse()
            .map_err(|_| AppError::validation("Unknown intern status"))?;
        where_sql.push_str(" AND i.status = ?");
        args.push(FilterValue::Str(status.as_ref().to_string()));
    }

    if let Some(id) = query.supervisor_id {
        where_sql.push_str(" AND i.supervisor_id = ?");
        args.push(FilterValue::U64(id));
    }

    if let Some(id) = query.handler_id {
        where_sql.push_str(" AND i.handler_id = ?");
        args.push(FilterValue::U64(id));
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        where_sql.push_str(
            " AND (CONCAT(u.first_name, ' ', u.last_name) LIKE ? OR u.email LIKE ? \
             OR i.school_name LIKE ? OR i.custom_intern_id LIKE ?)",
        );
        let pattern = format!("%{search}%");
        for _ in 0..4 {
            args.push(FilterValue::Str(pattern.clone()));
        }
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM interns i JOIN users u ON u.id = i.user_id{}",
        where_sql
    );
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.as_str()),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count interns");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "{INTERN_SELECT}{where_sql} ORDER BY u.last_name, u.first_name LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, InternRecord>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch intern list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(InternListResponse {
        data: rows.into_iter().map(Intern::from).collect(),
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/interns/{intern_id}",
    params(("intern_id" = u64, Path, description = "Intern id")),
    responses(
        (status = 200, description = "Intern found", body = Intern),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Intern not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Interns"
)]
pub async fn get_intern(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let intern_id = path.into_inner();
    auth.require_intern_access(intern_id)?;

    let record = fetch_intern(pool.get_ref(), intern_id).await?;
    Ok(HttpResponse::Ok().json(Intern::from(record)))
}

/// Partial update. Name and phone keys update the user row.
#[utoipa::path(
    put,
    path = "/api/interns/{intern_id}",
    params(("intern_id" = u64, Path, description = "Intern id")),
    request_body(content = Object, example = json!({"course": "BSCS", "phone_number": "+639171234567"})),
    responses(
        (status = 200, description = "Intern updated", body = Object, example = json!({"message": "Intern updated successfully"})),
        (status = 400, description = "Field cannot be updated"),
        (status = 404, description = "Intern not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Interns"
)]
pub async fn update_intern(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let intern_id = path.into_inner();
    auth.require_intern_access(intern_id)?;

    let allowed = if auth.is_intern() {
        SELF_EDITABLE
    } else {
        STAFF_EDITABLE
    };

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    if !update_profile(&mut tx, "interns", allowed, intern_id, &body).await? {
        return Err(AppError::not_found("Intern not found").into());
    }
    tx.commit().await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(json!({"message": "Intern updated successfully"})))
}

/// Gives each newly approved intern the next `Intern-<year>-<seq>` id.
async fn approve_pending(
    tx: &mut Transaction<'_, MySql>,
    ids: &[u64],
    year: i32,
) -> AppResult<Vec<u64>> {
    let sql = format!(
        "SELECT id FROM interns WHERE status = 'Pending' AND id IN ({}) ORDER BY id FOR UPDATE",
        placeholders(ids.len())
    );
    let mut q = sqlx::query_scalar::<_, u64>(&sql);
    for id in ids {
        q = q.bind(*id);
    }
    let pending = q.fetch_all(&mut **tx).await?;

    let mut issued = sqlx::query_scalar::<_, String>(
        "SELECT custom_intern_id FROM interns WHERE custom_intern_id LIKE ? FOR UPDATE",
    )
    .bind(format!("Intern-{year}-%"))
    .fetch_all(&mut **tx)
    .await?;

    for intern_id in &pending {
        let custom_id = next_custom_intern_id(year, issued.iter().map(String::as_str));
        sqlx::query(
            r#"
            UPDATE interns
            SET status = 'Approved',
                custom_intern_id = COALESCE(custom_intern_id, ?)
            WHERE id = ?
            "#,
        )
        .bind(&custom_id)
        .bind(intern_id)
        .execute(&mut **tx)
        .await?;
        issued.push(custom_id);
    }

    Ok(pending)
}

#[utoipa::path(
    put,
    path = "/api/interns/approve",
    request_body = InternIds,
    responses(
        (status = 200, description = "Pending interns approved", body = Object, example = json!({"message": "Interns approved", "approved": [7, 8]})),
        (status = 400, description = "ids missing"),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Interns"
)]
pub async fn approve_interns(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    notifier: web::Data<dyn Notifier>,
    payload: web::Json<InternIds>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;
    validate_ids(&payload.ids)?;

    let year = config.local_now().year();

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let approved = approve_pending(&mut tx, &payload.ids, year).await?;
    tx.commit().await.map_err(AppError::from)?;

    info!(by = auth.user_id, count = approved.len(), "Interns approved");

    for intern_id in &approved {
        notify_intern(
            pool.get_ref(),
            notifier.get_ref(),
            *intern_id,
            "Registration approved",
            "Your internship registration has been approved.",
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Interns approved",
        "approved": approved
    })))
}

#[utoipa::path(
    put,
    path = "/api/interns/archive",
    request_body = InternIds,
    responses(
        (status = 200, description = "Interns archived", body = Object, example = json!({"message": "Interns archived", "archived": 2})),
        (status = 400, description = "ids missing"),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "Interns"
)]
pub async fn archive_interns(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<InternIds>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;
    validate_ids(&payload.ids)?;

    let sql = format!(
        "UPDATE interns SET status = 'Archived' WHERE status <> 'Archived' AND id IN ({})",
        placeholders(payload.ids.len())
    );
    let mut q = sqlx::query(&sql);
    for id in &payload.ids {
        q = q.bind(*id);
    }
    let result = q.execute(pool.get_ref()).await.map_err(AppError::from)?;

    info!(by = auth.user_id, count = result.rows_affected(), "Interns archived");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Interns archived",
        "archived": result.rows_affected()
    })))
}

#[utoipa::path(
    get,
    path = "/api/interns/{intern_id}/hours",
    params(("intern_id" = u64, Path, description = "Intern id")),
    responses(
        (status = 200, description = "Rendered and remaining hours", body = RenderedHours),
        (status = 404, description = "Intern not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Interns"
)]
pub async fn intern_hours(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let intern_id = path.into_inner();
    auth.require_intern_access(intern_id)?;

    let record = fetch_intern(pool.get_ref(), intern_id).await?;
    Ok(HttpResponse::Ok().json(record.stored_hours()))
}

/// Recompute rendered hours from every DTR row
#[utoipa::path(
    post,
    path = "/api/interns/{intern_id}/hours/recalculate",
    params(("intern_id" = u64, Path, description = "Intern id")),
    responses(
        (status = 200, description = "Recomputed hours", body = RenderedHours),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Intern not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Interns"
)]
pub async fn recalculate_hours(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;
    let intern_id = path.into_inner();

    let hours = dtr_store::recalculate(pool.get_ref(), intern_id).await?;
    info!(intern_id, rendered = %hours.rendered, "Hours recalculated");

    Ok(HttpResponse::Ok().json(hours))
}

#[utoipa::path(
    put,
    path = "/api/interns/{intern_id}/fcm-token",
    params(("intern_id" = u64, Path, description = "Intern id")),
    request_body = FcmTokenReq,
    responses(
        (status = 200, description = "Token stored", body = Object, example = json!({"message": "Device token updated"})),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Intern not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Interns"
)]
pub async fn update_fcm_token(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<FcmTokenReq>,
) -> actix_web::Result<impl Responder> {
    let intern_id = path.into_inner();
    auth.require_intern_access(intern_id)?;

    let token = payload.fcm_token.trim();
    let result = sqlx::query("UPDATE interns SET fcm_token = ? WHERE id = ?")
        .bind((!token.is_empty()).then_some(token))
        .bind(intern_id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        // MySQL reports 0 when the value is unchanged, so check existence
        fetch_intern(pool.get_ref(), intern_id).await?;
    }

    Ok(HttpResponse::Ok().json(json!({"message": "Device token updated"})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_placeholder_lists() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn id_batches_are_bounded() {
        assert!(validate_ids(&[]).is_err());
        assert!(validate_ids(&[1, 2]).is_ok());
        assert!(validate_ids(&vec![1; 501]).is_err());
    }

    #[test]
    fn interns_cannot_reassign_themselves() {
        assert!(!SELF_EDITABLE.contains(&"supervisor_id"));
        assert!(!SELF_EDITABLE.contains(&"ojt_hours_required"));
        assert!(SELF_EDITABLE.iter().all(|c| STAFF_EDITABLE.contains(c)));
    }
}
