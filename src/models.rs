use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UserReq {
    #[schema(example = "Juan")]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[schema(example = "Dela Cruz")]
    pub last_name: String,
    #[serde(default)]
    pub suffix_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[schema(example = "juan@school.edu.ph")]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    #[schema(example = 4)]
    pub role_id: u8,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "juan@school.edu.ph")]
    pub email: String,
    pub password: String,
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64, // BIGINT UNSIGNED
    pub email: String,
    pub password: String,
    pub role_id: u8,
    pub is_active: bool,
    pub intern_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user has an intern profile
    pub intern_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
