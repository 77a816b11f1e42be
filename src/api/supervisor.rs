use crate::{
    api::{FilterValue, paginate},
    auth::auth::AuthUser,
    error::AppError,
    model::supervisor::{HANDLER_SELECT, Handler, ProfileStatus, SUPERVISOR_SELECT, Supervisor},
    utils::db_utils::update_profile,
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

const SUPERVISOR_EDITABLE: &[&str] = &["department"];
const HANDLER_EDITABLE: &[&str] = &["department", "supervisor_id"];

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SupervisorFilter {
    #[schema(example = "Approved")]
    /// Approved or Archived
    pub status: Option<String>,
    /// Matches name, email or department
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct SupervisorListResponse {
    pub data: Vec<Supervisor>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[utoipa::path(
    get,
    path = "/api/supervisors",
    params(SupervisorFilter),
    responses(
        (status = 200, description = "Paginated supervisor list", body = SupervisorListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisors"
)]
pub async fn list_supervisors(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SupervisorFilter>,
) -> actix_web::Result<impl Responder> {
    let (page, per_page, offset) = paginate(query.page, query.per_page);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(status) = query.status.as_deref() {
        let status: ProfileStatus = status
            .parse()
            .map_err(|_| AppError::validation("Unknown supervisor status"))?;
        where_sql.push_str(" AND s.status = ?");
        args.push(FilterValue::Str(status.as_ref().to_string()));
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        where_sql.push_str(
            " AND (CONCAT(u.first_name, ' ', u.last_name) LIKE ? OR u.email LIKE ? OR s.department LIKE ?)",
        );
        let pattern = format!("%{search}%");
        for _ in 0..3 {
            args.push(FilterValue::Str(pattern.clone()));
        }
    }

    let count_sql = format!(
        "SELECT COUNT(*) FROM supervisors s JOIN users u ON u.id = s.user_id{}",
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
        tracing::error!(error = %e, "Failed to count supervisors");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql =
        format!("{SUPERVISOR_SELECT}{where_sql} ORDER BY u.last_name, u.first_name LIMIT ? OFFSET ?");
    let mut data_q = sqlx::query_as::<_, Supervisor>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let supervisors = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch supervisor list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(SupervisorListResponse {
        data: supervisors,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/supervisors/{supervisor_id}",
    params(("supervisor_id" = u64, Path, description = "Supervisor id")),
    responses(
        (status = 200, description = "Supervisor found", body = Supervisor),
        (status = 404, description = "Supervisor not found", body = Object, example = json!({"message": "Supervisor not found"}))
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisors"
)]
pub async fn get_supervisor(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let supervisor_id = path.into_inner();

    let supervisor = sqlx::query_as::<_, Supervisor>(&format!("{SUPERVISOR_SELECT} WHERE s.id = ?"))
        .bind(supervisor_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, supervisor_id, "Failed to fetch supervisor");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match supervisor {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Supervisor not found"
        }))),
    }
}

#[utoipa::path(
    put,
    path = "/api/supervisors/{supervisor_id}",
    params(("supervisor_id" = u64, Path, description = "Supervisor id")),
    request_body(content = Object, example = json!({"department": "IT Department", "last_name": "Lopez"})),
    responses(
        (status = 200, description = "Supervisor updated", body = Object, example = json!({"message": "Supervisor updated successfully"})),
        (status = 400, description = "Field cannot be updated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Supervisor not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisors"
)]
pub async fn update_supervisor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let supervisor_id = path.into_inner();
    require_owner_or_admin(&auth, pool.get_ref(), "supervisors", supervisor_id).await?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    if !update_profile(&mut tx, "supervisors", SUPERVISOR_EDITABLE, supervisor_id, &body).await? {
        return Err(AppError::not_found("Supervisor not found").into());
    }
    tx.commit().await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(json!({"message": "Supervisor updated successfully"})))
}

#[utoipa::path(
    put,
    path = "/api/supervisors/{supervisor_id}/archive",
    params(("supervisor_id" = u64, Path, description = "Supervisor id")),
    responses(
        (status = 200, description = "Supervisor archived", body = Object, example = json!({"message": "Supervisor archived"})),
        (status = 400, description = "Supervisor not found or already archived"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisors"
)]
pub async fn archive_supervisor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let supervisor_id = path.into_inner();

    let result = sqlx::query(
        "UPDATE supervisors SET status = 'Archived' WHERE id = ? AND status <> 'Archived'",
    )
    .bind(supervisor_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, supervisor_id, "Archive supervisor failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Supervisor not found or already archived"
        })));
    }

    info!(supervisor_id, by = auth.user_id, "Supervisor archived");

    Ok(HttpResponse::Ok().json(json!({"message": "Supervisor archived"})))
}

#[utoipa::path(
    put,
    path = "/api/handlers/{handler_id}",
    params(("handler_id" = u64, Path, description = "Handler id")),
    request_body(content = Object, example = json!({"department": "Network Operations", "supervisor_id": 2})),
    responses(
        (status = 200, description = "Handler updated", body = Handler),
        (status = 400, description = "Field cannot be updated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Handler not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisors"
)]
pub async fn update_handler(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let handler_id = path.into_inner();
    require_owner_or_admin(&auth, pool.get_ref(), "handlers", handler_id).await?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    if !update_profile(&mut tx, "handlers", HANDLER_EDITABLE, handler_id, &body).await? {
        return Err(AppError::not_found("Handler not found").into());
    }
    let handler = sqlx::query_as::<_, Handler>(&format!("{HANDLER_SELECT} WHERE h.id = ?"))
        .bind(handler_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;
    tx.commit().await.map_err(AppError::from)?;

    info!(handler_id, by = auth.user_id, "Handler updated");

    Ok(HttpResponse::Ok().json(handler))
}

/// Admins edit any profile; supervisors and handlers only their own.
async fn require_owner_or_admin(
    auth: &AuthUser,
    pool: &MySqlPool,
    table: &str,
    profile_id: u64,
) -> actix_web::Result<()> {
    if auth.require_admin().is_ok() {
        return Ok(());
    }

    let owner = sqlx::query_scalar::<_, u64>(&format!("SELECT user_id FROM {table} WHERE id = ?"))
        .bind(profile_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)?;

    match owner {
        Some(user_id) => auth.require_self_or_admin(user_id),
        None => Err(AppError::not_found("Profile not found").into()),
    }
}
