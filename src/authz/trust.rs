use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::directory::{bounded, RoleDirectory};
use super::principal::normalize_principal;
use super::roles::Role;

/// Configured bootstrap super-admin identities, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuperAdminRoster {
    entries: Vec<String>,
}

impl SuperAdminRoster {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(Into::into)
                .filter(|entry| !entry.trim().is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list, skipping blank entries.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(',').map(str::trim))
    }

    pub fn contains(&self, principal_id: &str) -> bool {
        let wanted = normalize_principal(principal_id);
        !wanted.is_empty() && self.entries.iter().any(|entry| normalize_principal(entry) == wanted)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustState {
    /// Principal is not on the roster.
    NotConfigured,
    /// On the roster and no admin exists yet: bypass applies.
    Active,
    /// On the roster but an admin exists, or the admin lookup failed.
    Demoted,
}

/// Per-evaluation trust result. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrustDecision {
    pub is_configured_super_admin: bool,
    pub is_currently_active: bool,
}

impl From<TrustState> for TrustDecision {
    fn from(state: TrustState) -> Self {
        Self {
            is_configured_super_admin: state != TrustState::NotConfigured,
            is_currently_active: state == TrustState::Active,
        }
    }
}

/// Decides whether the super-admin bypass currently applies to a principal.
///
/// The roster identity stays privileged only while nobody holds the `admin`
/// role. Any directory failure is treated as "admins may exist".
#[derive(Clone)]
pub struct SuperAdminTrustEvaluator {
    roster: SuperAdminRoster,
    directory: Arc<dyn RoleDirectory>,
    timeout: Duration,
}

impl SuperAdminTrustEvaluator {
    pub fn new(roster: SuperAdminRoster, directory: Arc<dyn RoleDirectory>, timeout: Duration) -> Self {
        Self {
            roster,
            directory,
            timeout,
        }
    }

    pub async fn state(&self, principal_id: Option<&str>) -> TrustState {
        let Some(principal) = principal_id.filter(|p| self.roster.contains(p)) else {
            return TrustState::NotConfigured;
        };

        let admin = Role::Admin.as_str();
        match bounded(self.timeout, self.directory.list_principals_with_role(admin)).await {
            Ok(holders) if holders.is_empty() => TrustState::Active,
            Ok(holders) => {
                tracing::debug!(
                    principal = %principal,
                    admin_count = holders.len(),
                    "super_admin demoted: admin role is assigned"
                );
                TrustState::Demoted
            }
            Err(err) => {
                tracing::warn!(
                    principal = %principal,
                    error = %err,
                    "super_admin check failed; treating as demoted"
                );
                TrustState::Demoted
            }
        }
    }

    pub async fn evaluate(&self, principal_id: Option<&str>) -> TrustDecision {
        self.state(principal_id).await.into()
    }
}
