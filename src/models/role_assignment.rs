use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One principal/role pair as stored by the role-management subsystem.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoleAssignment {
    pub id: i64,
    pub principal_id: String,
    pub role_name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}
