use crate::{
    auth::{handlers::validate_new_password, password::hash_password},
    config::Config,
    error::AppError,
    utils::{
        mailer::{Mailer, reset_code_message},
        reset_codes::ResetCodeStore,
    },
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ForgotPasswordReq {
    #[schema(example = "juan@school.edu.ph")]
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyCodeReq {
    #[schema(example = "juan@school.edu.ph")]
    pub email: String,
    #[schema(example = "042137")]
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordReq {
    #[schema(example = "juan@school.edu.ph")]
    pub email: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Mail a 6-digit verification code to a registered email
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordReq,
    responses(
        (status = 200, description = "Code sent", body = Object, example = json!({"message": "Verification code sent"})),
        (status = 404, description = "Email not registered"),
        (status = 500, description = "Mail could not be delivered")
    ),
    tag = "Auth"
)]
#[instrument(name = "forgot_password", skip_all, fields(email = %payload.email))]
pub async fn forgot_password(
    payload: web::Json<ForgotPasswordReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    codes: web::Data<ResetCodeStore>,
    mailer: web::Data<dyn Mailer>,
) -> actix_web::Result<impl Responder> {
    let email = payload.email.trim().to_lowercase();

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND is_active = TRUE)",
    )
    .bind(&email)
    .fetch_one(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    if !exists {
        return Err(AppError::not_found("Email not registered").into());
    }

    let code = codes.issue(&email).await;
    let text = reset_code_message(&code, config.reset_code_ttl_secs / 60);

    if let Err(e) = mailer.send(&email, "Your password reset code", &text).await {
        error!(error = %e, "Failed to send reset code");
        codes.clear(&email).await;
        return Err(AppError::Internal(e.to_string()).into());
    }

    info!("Reset code sent");

    Ok(HttpResponse::Ok().json(json!({"message": "Verification code sent"})))
}

#[utoipa::path(
    post,
    path = "/auth/verify-code",
    request_body = VerifyCodeReq,
    responses(
        (status = 200, description = "Code accepted", body = Object, example = json!({"message": "Code verified"})),
        (status = 400, description = "Code invalid or expired")
    ),
    tag = "Auth"
)]
pub async fn verify_code(
    payload: web::Json<VerifyCodeReq>,
    codes: web::Data<ResetCodeStore>,
) -> actix_web::Result<impl Responder> {
    codes.verify(&payload.email, &payload.code).await?;
    Ok(HttpResponse::Ok().json(json!({"message": "Code verified"})))
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordReq,
    responses(
        (status = 200, description = "Password reset", body = Object, example = json!({"message": "Password has been reset"})),
        (status = 400, description = "Code not verified or password invalid")
    ),
    tag = "Auth"
)]
#[instrument(name = "reset_password", skip_all, fields(email = %payload.email))]
pub async fn reset_password(
    payload: web::Json<ResetPasswordReq>,
    pool: web::Data<MySqlPool>,
    codes: web::Data<ResetCodeStore>,
) -> actix_web::Result<impl Responder> {
    if !codes.check_verified(&payload.email).await {
        return Err(AppError::validation("Verify the emailed code first").into());
    }
    validate_new_password(&payload.new_password, &payload.confirm_password)?;

    let email = payload.email.trim().to_lowercase();
    let hashed = hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;

    let user_id = sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Email not registered"))?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

    tx.commit().await.map_err(AppError::from)?;
    codes.clear(&email).await;

    info!(user_id, "Password reset");

    Ok(HttpResponse::Ok().json(json!({"message": "Password has been reset"})))
}
