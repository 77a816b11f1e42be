use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::role::Role,
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateInternProfile {
    #[schema(example = "2021-00123")]
    pub student_id: String,
    #[schema(example = "Polytechnic University")]
    pub school_name: String,
    #[schema(example = "BSIT")]
    pub course: String,
    #[serde(default)]
    pub address: String,
    #[schema(example = 2)]
    pub supervisor_id: Option<u64>,
    pub handler_id: Option<u64>,
    #[schema(example = 500)]
    pub ojt_hours_required: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSupervisorProfile {
    #[schema(example = "IT Department")]
    pub department: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateHandlerProfile {
    #[schema(example = "Network Operations")]
    pub department: String,
    #[schema(example = 2)]
    pub supervisor_id: Option<u64>,
}

/// Checks that `user_id` exists and carries `role`.
async fn expect_role(tx: &mut Transaction<'_, MySql>, user_id: u64, role: Role) -> AppResult<()> {
    let role_id = sqlx::query_scalar::<_, u8>("SELECT role_id FROM users WHERE id = ? FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if role_id != role.id() {
        return Err(AppError::validation(format!(
            "User {user_id} is not a {}",
            role.as_str()
        )));
    }
    Ok(())
}

/// Duplicate user_id and dangling foreign keys both surface as 23000.
fn profile_exists(e: sqlx::Error) -> AppError {
    let constraint = matches!(&e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"));
    if constraint {
        AppError::conflict("Profile already exists or references an unknown record")
    } else {
        AppError::Database(e)
    }
}

/// Attach an intern profile to an existing intern user
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/intern",
    params(("user_id" = u64, Path, description = "User with the Intern role")),
    request_body = CreateInternProfile,
    responses(
        (status = 201, description = "Intern profile created", body = Object, example = json!({"message": "Intern profile created", "id": 7})),
        (status = 400, description = "User does not have the Intern role"),
        (status = 403, description = "Staff only"),
        (status = 409, description = "Profile already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_intern_profile(
    auth: AuthUser,
    path: web::Path<u64>,
    payload: web::Json<CreateInternProfile>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;
    let user_id = path.into_inner();

    if payload.ojt_hours_required <= 0 {
        return Err(AppError::validation("OJT hours required must be positive").into());
    }

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    expect_role(&mut tx, user_id, Role::Intern).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO interns
            (user_id, student_id, school_name, course, address, supervisor_id, handler_id, ojt_hours_required)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(payload.student_id.trim())
    .bind(payload.school_name.trim())
    .bind(payload.course.trim())
    .bind(payload.address.trim())
    .bind(payload.supervisor_id)
    .bind(payload.handler_id)
    .bind(payload.ojt_hours_required)
    .execute(&mut *tx)
    .await
    .map_err(profile_exists)?;

    tx.commit().await.map_err(AppError::from)?;

    let id = result.last_insert_id();
    info!(user_id, intern_id = id, "Intern profile created");

    Ok(HttpResponse::Created().json(json!({"message": "Intern profile created", "id": id})))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/supervisor",
    params(("user_id" = u64, Path, description = "User with the Supervisor role")),
    request_body = CreateSupervisorProfile,
    responses(
        (status = 201, description = "Supervisor profile created", body = Object, example = json!({"message": "Supervisor profile created", "id": 2})),
        (status = 400, description = "User does not have the Supervisor role"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Profile already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_supervisor_profile(
    auth: AuthUser,
    path: web::Path<u64>,
    payload: web::Json<CreateSupervisorProfile>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    expect_role(&mut tx, user_id, Role::Supervisor).await?;

    let result = sqlx::query("INSERT INTO supervisors (user_id, department) VALUES (?, ?)")
        .bind(user_id)
        .bind(payload.department.trim())
        .execute(&mut *tx)
        .await
        .map_err(profile_exists)?;

    tx.commit().await.map_err(AppError::from)?;

    let id = result.last_insert_id();
    info!(user_id, supervisor_id = id, "Supervisor profile created");

    Ok(HttpResponse::Created().json(json!({"message": "Supervisor profile created", "id": id})))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/handler",
    params(("user_id" = u64, Path, description = "User with the Handler role")),
    request_body = CreateHandlerProfile,
    responses(
        (status = 201, description = "Handler profile created", body = Object, example = json!({"message": "Handler profile created", "id": 3})),
        (status = 400, description = "User does not have the Handler role"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Profile already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_handler_profile(
    auth: AuthUser,
    path: web::Path<u64>,
    payload: web::Json<CreateHandlerProfile>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    expect_role(&mut tx, user_id, Role::Handler).await?;

    let result =
        sqlx::query("INSERT INTO handlers (user_id, supervisor_id, department) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(payload.supervisor_id)
            .bind(payload.department.trim())
            .execute(&mut *tx)
            .await
            .map_err(profile_exists)?;

    tx.commit().await.map_err(AppError::from)?;

    let id = result.last_insert_id();
    info!(user_id, handler_id = id, "Handler profile created");

    Ok(HttpResponse::Created().json(json!({"message": "Handler profile created", "id": id})))
}
