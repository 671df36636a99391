use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::principal::normalize_principal;
use crate::errors::DirectoryError;

/// Read-only view of role assignments.
///
/// Principal and role comparisons ignore ASCII case and surrounding
/// whitespace in every implementation.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn has_role(&self, principal_id: &str, role: &str) -> Result<bool, DirectoryError>;

    /// Principals currently holding `role`, ordered.
    async fn list_principals_with_role(&self, role: &str) -> Result<Vec<String>, DirectoryError>;

    /// Roles currently held by `principal_id`, ordered.
    async fn list_roles(&self, principal_id: &str) -> Result<Vec<String>, DirectoryError>;
}

/// Runs a directory call with an upper bound on its duration.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, DirectoryError>
where
    F: Future<Output = Result<T, DirectoryError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DirectoryError::Timeout(limit)),
    }
}

/// Directory held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRoleDirectory {
    // role -> principals
    assignments: RwLock<BTreeMap<String, BTreeSet<String>>>,
}

impl InMemoryRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn assign(&self, principal_id: &str, role: &str) {
        let mut guard = self.assignments.write().await;
        guard
            .entry(role.trim().to_ascii_lowercase())
            .or_default()
            .insert(normalize_principal(principal_id));
    }

    pub async fn revoke(&self, principal_id: &str, role: &str) {
        let mut guard = self.assignments.write().await;
        if let Some(holders) = guard.get_mut(&role.trim().to_ascii_lowercase()) {
            holders.remove(&normalize_principal(principal_id));
            if holders.is_empty() {
                guard.remove(&role.trim().to_ascii_lowercase());
            }
        }
    }
}

#[async_trait]
impl RoleDirectory for InMemoryRoleDirectory {
    async fn has_role(&self, principal_id: &str, role: &str) -> Result<bool, DirectoryError> {
        let guard = self.assignments.read().await;
        Ok(guard
            .get(&role.trim().to_ascii_lowercase())
            .map(|holders| holders.contains(&normalize_principal(principal_id)))
            .unwrap_or(false))
    }

    async fn list_principals_with_role(&self, role: &str) -> Result<Vec<String>, DirectoryError> {
        let guard = self.assignments.read().await;
        Ok(guard
            .get(&role.trim().to_ascii_lowercase())
            .map(|holders| holders.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_roles(&self, principal_id: &str) -> Result<Vec<String>, DirectoryError> {
        let wanted = normalize_principal(principal_id);
        let guard = self.assignments.read().await;
        Ok(guard
            .iter()
            .filter(|(_, holders)| holders.contains(&wanted))
            .map(|(role, _)| role.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookups_ignore_case() {
        let directory = InMemoryRoleDirectory::new();
        directory.assign("Alice", "Admin").await;

        assert!(directory.has_role(" alice ", "admin").await.unwrap());
        assert_eq!(directory.list_principals_with_role("ADMIN").await.unwrap(), vec!["alice"]);
        assert_eq!(directory.list_roles("ALICE").await.unwrap(), vec!["admin"]);
    }

    #[tokio::test]
    async fn revoke_removes_empty_roles() {
        let directory = InMemoryRoleDirectory::new();
        directory.assign("alice", "admin").await;
        directory.revoke("alice", "admin").await;

        assert!(directory.list_principals_with_role("admin").await.unwrap().is_empty());
        assert!(!directory.has_role("alice", "admin").await.unwrap());
    }

    #[tokio::test]
    async fn bounded_reports_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, DirectoryError>(true)
        };
        let result = bounded(Duration::from_millis(10), slow).await;
        assert!(matches!(result, Err(DirectoryError::Timeout(_))));
    }
}
