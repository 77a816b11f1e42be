use crate::{
    auth::{
        auth::AuthUser,
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{AppError, AppResult},
    model::role::Role,
    models::{LoginReqDto, TokenType, UserReq, UserSql},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

const USER_LOGIN_SELECT: &str = r#"
    SELECT u.id, u.email, u.password, u.role_id, u.is_active, i.id AS intern_id
    FROM users u
    LEFT JOIN interns i ON i.user_id = u.id
"#;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterInternReq {
    #[serde(flatten)]
    pub user: UserReq,
    #[schema(example = "2021-00123")]
    pub student_id: String,
    #[schema(example = "Polytechnic University")]
    pub school_name: String,
    #[schema(example = "BSIT")]
    pub course: String,
    #[serde(default)]
    pub address: String,
    #[schema(example = 500)]
    pub ojt_hours_required: i32,
    #[schema(example = 2)]
    pub supervisor_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordReq {
    /// Required unless an admin changes someone else's password
    pub current_password: Option<String>,
    pub new_password: String,
    pub confirm_password: String,
}

pub(crate) fn validate_new_password(password: &str, confirm: &str) -> AppResult<()> {
    if password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }
    if password != confirm {
        return Err(AppError::validation("Passwords do not match"));
    }
    Ok(())
}

fn validate_user(user: &UserReq) -> AppResult<()> {
    if user.first_name.trim().is_empty() || user.last_name.trim().is_empty() {
        return Err(AppError::validation("First and last name are required"));
    }
    if !user.email.contains('@') {
        return Err(AppError::validation("A valid email is required"));
    }
    validate_new_password(&user.password, &user.confirm_password)
}

fn is_duplicate(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

/// Inserts a user row inside `tx` and returns its id.
pub(crate) async fn insert_user(
    tx: &mut Transaction<'_, MySql>,
    user: &UserReq,
    role: Role,
) -> AppResult<u64> {
    let hashed = hash_password(&user.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (first_name, middle_name, last_name, suffix_name, phone_number, email, password, role_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.first_name.trim())
    .bind(user.middle_name.trim())
    .bind(user.last_name.trim())
    .bind(user.suffix_name.trim())
    .bind(user.phone_number.trim())
    .bind(user.email.trim().to_lowercase())
    .bind(hashed)
    .bind(role.id())
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if is_duplicate(&e) {
            AppError::conflict("Email already registered")
        } else {
            AppError::Database(e)
        }
    })?;

    Ok(result.last_insert_id())
}

async fn store_refresh_token(pool: &MySqlPool, user_id: u64, jti: &str, exp: usize) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(jti)
    .bind(exp as i64)
    .execute(pool)
    .await?;
    Ok(())
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Admin creates a staff or intern account
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserReq,
    responses(
        (status = 201, description = "User created", body = Object, example = json!({"message": "User created", "id": 12})),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(name = "create_user", skip(auth, pool, user), fields(email = %user.email))]
pub async fn create_user(
    auth: AuthUser,
    user: web::Json<UserReq>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    validate_user(&user)?;

    let role = Role::from_id(user.role_id)
        .ok_or_else(|| AppError::validation("Unknown role_id"))?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let id = insert_user(&mut tx, &user, role).await?;
    tx.commit().await.map_err(AppError::from)?;

    info!(user_id = id, role = role.as_str(), "User created");

    Ok(HttpResponse::Created().json(json!({
        "message": "User created",
        "id": id
    })))
}

/// Self-registration for interns. The profile starts out Pending.
#[utoipa::path(
    post,
    path = "/auth/register-intern",
    request_body = RegisterInternReq,
    responses(
        (status = 201, description = "Intern registered", body = Object, example = json!({"message": "Registration submitted", "intern_id": 7, "status": "Pending"})),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
#[instrument(name = "register_intern", skip(pool, req), fields(email = %req.user.email))]
pub async fn register_intern(
    req: web::Json<RegisterInternReq>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    validate_user(&req.user)?;

    if req.student_id.trim().is_empty() || req.school_name.trim().is_empty() {
        return Err(AppError::validation("Student id and school are required").into());
    }
    if req.ojt_hours_required <= 0 {
        return Err(AppError::validation("OJT hours required must be positive").into());
    }

    let mut tx = pool.begin().await.map_err(AppError::from)?;

    let user_id = insert_user(&mut tx, &req.user, Role::Intern).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO interns
            (user_id, student_id, school_name, course, address, supervisor_id, ojt_hours_required)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(req.student_id.trim())
    .bind(req.school_name.trim())
    .bind(req.course.trim())
    .bind(req.address.trim())
    .bind(req.supervisor_id)
    .bind(req.ojt_hours_required)
    .execute(&mut *tx)
    .await
    .map_err(AppError::from)?;

    tx.commit().await.map_err(AppError::from)?;

    let intern_id = result.last_insert_id();
    info!(user_id, intern_id, "Intern registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "Registration submitted",
        "intern_id": intern_id,
        "status": "Pending"
    })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({"message": "Email and password required"}));
    }

    let email = user.email.trim().to_lowercase();

    debug!("Fetching user from database");

    // 2️⃣ Fetch user
    let db_user = match sqlx::query_as::<_, UserSql>(&format!("{USER_LOGIN_SELECT} WHERE u.email = ?"))
        .bind(&email)
        .fetch_optional(pool.get_ref())
        .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().json(json!({"message": "Invalid credentials"}));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if !db_user.is_active {
        info!(user_id = db_user.id, "Login refused: account disabled");
        return HttpResponse::Unauthorized().json(json!({"message": "Account disabled"}));
    }

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({"message": "Invalid credentials"}));
    }

    debug!("Password verified");

    let subject = TokenSubject {
        user_id: db_user.id,
        email: db_user.email.clone(),
        role: db_user.role_id,
        intern_id: db_user.intern_id,
    };

    // 4️⃣ Generate tokens
    let tokens = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)
        .and_then(|access| {
            generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)
                .map(|refresh| (access, refresh))
        });

    let (access_token, (refresh_token, refresh_claims)) = match tokens {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign tokens");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 5️⃣ Store refresh token
    debug!(user_id = db_user.id, jti = %refresh_claims.jti, "Storing refresh token");

    if let Err(e) =
        store_refresh_token(pool.get_ref(), db_user.id, &refresh_claims.jti, refresh_claims.exp).await
    {
        error!(error = %e, "Failed to store refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // 6️⃣ Update last_login_at (non-fatal)
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = db_user.id, "Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// Exchange a refresh token for a new token pair. The old refresh token is revoked.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = LoginResponse),
        (status = 401, description = "Refresh token missing, invalid or revoked")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let unauthorized = || AppError::Unauthorized("Invalid refresh token".into());

    let token = bearer(&req).ok_or_else(unauthorized)?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|_| unauthorized())?;

    if claims.token_type != TokenType::Refresh {
        return Err(unauthorized().into());
    }

    // 🔥 revoke old refresh token; zero rows means unknown or already used
    let revoked = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE",
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    if revoked.rows_affected() == 0 {
        info!(user_id = claims.user_id, "Refresh refused: token revoked or unknown");
        return Err(unauthorized().into());
    }

    let subject = TokenSubject::from(&claims);

    let (new_refresh_token, new_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(|e| AppError::Internal(e.to_string()))?;

    store_refresh_token(pool.get_ref(), subject.user_id, &new_claims.jti, new_claims.exp).await?;

    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token: new_refresh_token,
    }))
}

/// Revoke a refresh token. Always answers 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    // idempotent
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/password",
    params(("user_id" = u64, Path, description = "User whose password changes")),
    request_body = ChangePasswordReq,
    responses(
        (status = 200, description = "Password changed", body = Object, example = json!({"message": "Password updated"})),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Current password is wrong"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn change_password(
    auth: AuthUser,
    path: web::Path<u64>,
    payload: web::Json<ChangePasswordReq>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(user_id)?;
    validate_new_password(&payload.new_password, &payload.confirm_password)?;

    let current_hash = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    // Admins resetting someone else skip the current-password check
    if auth.user_id == user_id || auth.role != Role::Admin {
        let current = payload.current_password.as_deref().unwrap_or_default();
        verify_password(current, &current_hash)
            .map_err(|_| AppError::Unauthorized("Current password is incorrect".into()))?;
    }

    let hashed = hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed)
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    info!(user_id, changed_by = auth.user_id, "Password changed");

    Ok(HttpResponse::Ok().json(json!({"message": "Password updated"})))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(password: &str, confirm: &str) -> UserReq {
        serde_json::from_value(json!({
            "first_name": "Juan",
            "last_name": "Dela Cruz",
            "email": "juan@school.edu.ph",
            "password": password,
            "confirm_password": confirm,
            "role_id": 4
        }))
        .unwrap()
    }

    #[test]
    fn rejects_short_or_mismatched_passwords() {
        assert!(validate_user(&req("longenough", "longenough")).is_ok());
        assert!(validate_user(&req("short", "short")).is_err());
        assert!(validate_user(&req("longenough", "different1")).is_err());
    }

    #[test]
    fn register_payload_flattens_user_fields() {
        let payload: RegisterInternReq = serde_json::from_value(json!({
            "first_name": "Juan",
            "last_name": "Dela Cruz",
            "email": "juan@school.edu.ph",
            "password": "longenough",
            "confirm_password": "longenough",
            "role_id": 4,
            "student_id": "2021-00123",
            "school_name": "Polytechnic University",
            "course": "BSIT",
            "ojt_hours_required": 500
        }))
        .unwrap();
        assert_eq!(payload.user.email, "juan@school.edu.ph");
        assert_eq!(payload.supervisor_id, None);
        assert_eq!(payload.address, "");
    }
}
