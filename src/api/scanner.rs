use crate::{
    api::{FilterValue, paginate},
    auth::auth::AuthUser,
    config::Config,
    dtr::{
        hms::parse_date_param,
        scan::{ScanKind, Slot},
    },
    error::{AppError, AppResult},
    model::dtr_entry::{DTR_SELECT, DtrEntry, DtrEntryView},
    utils::dtr_store::{self, ScanOutcome, SlotChoice},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ScanReq {
    /// Numeric intern id; either this or `custom_intern_id` is required
    #[schema(example = 7)]
    pub intern_id: Option<u64>,
    /// Value encoded in the intern's QR code
    #[schema(example = "Intern-2025-007")]
    pub custom_intern_id: Option<String>,
    pub kind: ScanKind,
}

#[derive(Deserialize, ToSchema)]
pub struct BatchReq {
    #[schema(example = json!([7, 8, 9]))]
    pub ids: Vec<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct BatchFailure {
    pub intern_id: u64,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct BatchResponse {
    pub recorded: Vec<ScanOutcome>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DtrFilter {
    #[schema(example = 7)]
    pub intern_id: Option<u64>,
    /// First day, YYYY-MM-DD or MM-DD-YYYY
    #[schema(example = "2025-04-01")]
    pub from: Option<String>,
    /// Last day, inclusive
    #[schema(example = "2025-04-30")]
    pub to: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct DtrListResponse {
    pub data: Vec<DtrEntryView>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

async fn resolve_intern(pool: &MySqlPool, req: &ScanReq) -> AppResult<u64> {
    if let Some(id) = req.intern_id {
        return Ok(id);
    }

    let custom = req
        .custom_intern_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("intern_id or custom_intern_id is required"))?;

    sqlx::query_scalar::<_, u64>("SELECT id FROM interns WHERE custom_intern_id = ?")
        .bind(custom)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No intern with id {custom}")))
}

/// Records the same slot for many interns; one failure does not stop the rest.
async fn record_batch(
    pool: &MySqlPool,
    config: &Config,
    ids: &[u64],
    slot: Slot,
    work_date: NaiveDate,
    at: NaiveTime,
) -> AppResult<BatchResponse> {
    if ids.is_empty() {
        return Err(AppError::validation("ids must not be empty"));
    }

    let rules = config.scan_rules();
    let mut recorded = Vec::with_capacity(ids.len());
    let mut failed = Vec::new();

    for &intern_id in ids {
        match dtr_store::record(pool, &rules, intern_id, work_date, SlotChoice::Fixed(slot), at).await {
            Ok(outcome) => recorded.push(outcome),
            Err(AppError::Database(e)) => return Err(AppError::Database(e)),
            Err(e) => {
                warn!(intern_id, %slot, error = %e, "Batch scan skipped");
                failed.push(BatchFailure {
                    intern_id,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(BatchResponse { recorded, failed })
}

/// Record a QR scan. The slot is picked from the time of day.
#[utoipa::path(
    post,
    path = "/api/dtr/scan",
    request_body = ScanReq,
    responses(
        (status = 200, description = "Scan recorded", body = Object, example = json!({
            "message": "Scan recorded",
            "late": false,
            "data": {"intern_id": 7, "work_date": "2025-04-07", "slot": "time_in_am", "time": "07:58:12", "total_hours": "00:00:00", "rendered": null}
        })),
        (status = 400, description = "No open session or missing time-in"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Intern not found"),
        (status = 409, description = "Slot already set")
    ),
    security(("bearer_auth" = [])),
    tag = "DTR"
)]
pub async fn scan(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<ScanReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let intern_id = resolve_intern(pool.get_ref(), &payload).await?;
    let now = config.local_now();
    let at = now.time().with_nanosecond(0).unwrap_or(now.time());

    let outcome = dtr_store::record(
        pool.get_ref(),
        &config.scan_rules(),
        intern_id,
        now.date_naive(),
        SlotChoice::Auto(payload.kind),
        at,
    )
    .await?;

    let late = outcome.slot == Slot::TimeInAm && config.late_window().is_late(Some(outcome.time));

    Ok(HttpResponse::Ok().json(json!({
        "message": "Scan recorded",
        "late": late,
        "data": outcome
    })))
}

/// Set one slot to the current time for several interns
#[utoipa::path(
    put,
    path = "/api/dtr/slot/{slot}",
    params(("slot" = Slot, Path, description = "time_in_am, time_out_am, time_in_pm or time_out_pm")),
    request_body = BatchReq,
    responses(
        (status = 200, description = "Per-intern results", body = BatchResponse),
        (status = 400, description = "Unknown slot or empty ids"),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "DTR"
)]
pub async fn set_slot(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<String>,
    payload: web::Json<BatchReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let slot: Slot = path
        .parse()
        .map_err(|_| AppError::validation(format!("Unknown slot '{}'", path.as_str())))?;

    let now = config.local_now();
    let at = now.time().with_nanosecond(0).unwrap_or(now.time());

    let response = record_batch(pool.get_ref(), &config, &payload.ids, slot, now.date_naive(), at).await?;

    info!(%slot, recorded = response.recorded.len(), failed = response.failed.len(), "Slot batch applied");

    Ok(HttpResponse::Ok().json(response))
}

/// Morning time-in at the configured default (08:00:00) for several interns
#[utoipa::path(
    post,
    path = "/api/dtr/default-time-in",
    request_body = BatchReq,
    responses(
        (status = 200, description = "Per-intern results", body = BatchResponse),
        (status = 400, description = "Empty ids"),
        (status = 403, description = "Staff only")
    ),
    security(("bearer_auth" = [])),
    tag = "DTR"
)]
pub async fn default_time_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<BatchReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let today = config.local_now().date_naive();
    let response = record_batch(
        pool.get_ref(),
        &config,
        &payload.ids,
        Slot::TimeInAm,
        today,
        config.default_time_in,
    )
    .await?;

    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/dtr",
    params(DtrFilter),
    responses(
        (status = 200, description = "Paginated DTR rows, newest first", body = DtrListResponse),
        (status = 400, description = "Bad date"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "DTR"
)]
pub async fn list_dtr(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DtrFilter>,
) -> actix_web::Result<impl Responder> {
    // Interns only ever see their own rows
    let intern_id = if auth.is_intern() {
        let own = auth
            .intern_id
            .ok_or_else(|| AppError::forbidden("No intern profile"))?;
        if query.intern_id.is_some_and(|id| id != own) {
            return Err(actix_web::error::ErrorForbidden("Not allowed to access this intern"));
        }
        Some(own)
    } else {
        query.intern_id
    };

    let (page, per_page, offset) = paginate(query.page, query.per_page);

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(id) = intern_id {
        where_sql.push_str(" AND intern_id = ?");
        args.push(FilterValue::U64(id));
    }

    if let Some(from) = query.from.as_deref() {
        where_sql.push_str(" AND work_date >= ?");
        args.push(FilterValue::Date(parse_date_param(from).map_err(AppError::from)?));
    }

    if let Some(to) = query.to.as_deref() {
        where_sql.push_str(" AND work_date <= ?");
        args.push(FilterValue::Date(parse_date_param(to).map_err(AppError::from)?));
    }

    let count_sql = format!("SELECT COUNT(*) FROM dtr_entries{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.as_str()),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count DTR rows");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!("{DTR_SELECT}{where_sql} ORDER BY work_date DESC, intern_id LIMIT ? OFFSET ?");
    let mut data_q = sqlx::query_as::<_, DtrEntry>(&data_sql);
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
            tracing::error!(error = %e, "Failed to fetch DTR rows");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(DtrListResponse {
        data: rows.into_iter().map(DtrEntryView::from).collect(),
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
