use async_trait::async_trait;
use sqlx::SqlitePool;

use super::directory::RoleDirectory;
use super::principal::normalize_principal;
use crate::errors::DirectoryError;
use crate::models::role_assignment::RoleAssignment;

/// [`RoleDirectory`] backed by the `role_assignments` table. Never writes.
#[derive(Debug, Clone)]
pub struct SqliteRoleDirectory {
    pool: SqlitePool,
}

impl SqliteRoleDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Full assignment rows for a role, oldest first.
    pub async fn assignments_for_role(&self, role: &str) -> Result<Vec<RoleAssignment>, DirectoryError> {
        let rows = sqlx::query_as::<_, RoleAssignment>(
            "SELECT id, principal_id, role_name, created_at, created_by, notes, updated_at, updated_by \
             FROM role_assignments WHERE LOWER(role_name) = ? ORDER BY created_at, id",
        )
        .bind(role.trim().to_ascii_lowercase())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl RoleDirectory for SqliteRoleDirectory {
    async fn has_role(&self, principal_id: &str, role: &str) -> Result<bool, DirectoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(1) FROM role_assignments \
             WHERE LOWER(TRIM(principal_id)) = ? AND LOWER(role_name) = ?",
        )
        .bind(normalize_principal(principal_id))
        .bind(role.trim().to_ascii_lowercase())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn list_principals_with_role(&self, role: &str) -> Result<Vec<String>, DirectoryError> {
        let principals = sqlx::query_scalar::<_, String>(
            "SELECT principal_id FROM role_assignments WHERE LOWER(role_name) = ? ORDER BY principal_id",
        )
        .bind(role.trim().to_ascii_lowercase())
        .fetch_all(&self.pool)
        .await?;

        Ok(principals)
    }

    async fn list_roles(&self, principal_id: &str) -> Result<Vec<String>, DirectoryError> {
        let roles = sqlx::query_scalar::<_, String>(
            "SELECT role_name FROM role_assignments WHERE LOWER(TRIM(principal_id)) = ? ORDER BY role_name",
        )
        .bind(normalize_principal(principal_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }
}
