use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize, Deserialize, ToSchema)]
#[strum(ascii_case_insensitive)]
pub enum ProfileStatus {
    Approved,
    Archived,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Supervisor {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = 5)]
    pub user_id: u64,
    #[schema(example = "Maria")]
    pub first_name: String,
    #[schema(example = "Lopez")]
    pub last_name: String,
    #[schema(example = "maria@company.ph")]
    pub email: String,
    #[schema(example = "IT Department")]
    pub department: String,
    #[schema(example = "Approved")]
    pub status: String,
}

pub const SUPERVISOR_SELECT: &str = r#"
    SELECT s.id, s.user_id, u.first_name, u.last_name, u.email, s.department, s.status
    FROM supervisors s
    JOIN users u ON u.id = s.user_id
"#;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Handler {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = 9)]
    pub user_id: u64,
    #[schema(example = 2, nullable = true)]
    pub supervisor_id: Option<u64>,
    #[schema(example = "Pedro")]
    pub first_name: String,
    #[schema(example = "Garcia")]
    pub last_name: String,
    #[schema(example = "Network Operations")]
    pub department: String,
    #[schema(example = "Approved")]
    pub status: String,
}

pub const HANDLER_SELECT: &str = r#"
    SELECT h.id, h.user_id, h.supervisor_id, u.first_name, u.last_name, h.department, h.status
    FROM handlers h
    JOIN users u ON u.id = h.user_id
"#;
