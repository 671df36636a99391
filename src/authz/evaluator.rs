use std::sync::Arc;
use std::time::Duration;

use super::directory::{bounded, RoleDirectory};
use super::outcome::{return_url, Outcome};
use super::policy::PolicyRegistry;
use super::principal::Identity;
use super::trust::{SuperAdminRoster, SuperAdminTrustEvaluator, TrustState};

/// Everything the engine needs to know about one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Identity,
    pub operation_id: String,
    /// Endpoint-level anonymous marker, independent of the policy registry.
    pub allow_anonymous: bool,
    pub path: String,
    pub query: Option<String>,
}

impl RequestContext {
    pub fn new(identity: Identity, operation_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            identity,
            operation_id: operation_id.into(),
            allow_anonymous: false,
            path: path.into(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn anonymous_allowed(mut self) -> Self {
        self.allow_anonymous = true;
        self
    }
}

/// Produces one [`Outcome`] per request.
///
/// Evaluation order, stopping at the first decisive step:
/// 1. anonymous endpoint -> allow
/// 2. unauthenticated -> redirect to login
/// 3. active super-admin -> allow
/// 4. no required roles -> allow
/// 5. no principal id -> access denied
/// 6. any required role held -> allow, otherwise access denied
///
/// Holds no per-request state; trust is recomputed on every call.
#[derive(Clone)]
pub struct AuthorizationEngine {
    registry: Arc<PolicyRegistry>,
    trust: SuperAdminTrustEvaluator,
    directory: Arc<dyn RoleDirectory>,
    timeout: Duration,
}

impl AuthorizationEngine {
    pub fn new(
        registry: Arc<PolicyRegistry>,
        directory: Arc<dyn RoleDirectory>,
        roster: SuperAdminRoster,
        timeout: Duration,
    ) -> Self {
        let trust = SuperAdminTrustEvaluator::new(roster, directory.clone(), timeout);
        Self {
            registry,
            trust,
            directory,
            timeout,
        }
    }

    pub fn trust(&self) -> &SuperAdminTrustEvaluator {
        &self.trust
    }

    pub fn directory(&self) -> &Arc<dyn RoleDirectory> {
        &self.directory
    }

    pub async fn evaluate(&self, ctx: &RequestContext) -> Outcome {
        let policy = self.registry.resolve(&ctx.operation_id);
        let principal = ctx.identity.principal();

        if ctx.allow_anonymous || policy.allow_anonymous {
            tracing::debug!(path = %ctx.path, operation = %ctx.operation_id, "anonymous endpoint");
            return Outcome::Allow;
        }

        if !ctx.identity.is_authenticated {
            tracing::info!(
                path = %ctx.path,
                operation = %ctx.operation_id,
                "unauthenticated request; redirecting to login"
            );
            return Outcome::RedirectToLogin {
                return_url: return_url(&ctx.path, ctx.query.as_deref()),
            };
        }

        if self.trust.state(principal).await == TrustState::Active {
            tracing::info!(
                path = %ctx.path,
                operation = %ctx.operation_id,
                principal = principal.unwrap_or_default(),
                "super_admin bypass"
            );
            return Outcome::Allow;
        }

        if policy.required_roles.is_empty() {
            tracing::debug!(
                path = %ctx.path,
                operation = %ctx.operation_id,
                principal = principal.unwrap_or_default(),
                "authenticated; no role required"
            );
            return Outcome::Allow;
        }

        let Some(principal) = principal else {
            tracing::info!(
                path = %ctx.path,
                operation = %ctx.operation_id,
                reason = "missing_principal_identifier",
                "access denied"
            );
            return Outcome::RedirectToAccessDenied;
        };

        for role in &policy.required_roles {
            match bounded(self.timeout, self.directory.has_role(principal, role)).await {
                Ok(true) => {
                    tracing::debug!(
                        path = %ctx.path,
                        operation = %ctx.operation_id,
                        principal = %principal,
                        role = %role,
                        "role match"
                    );
                    return Outcome::Allow;
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(
                        path = %ctx.path,
                        operation = %ctx.operation_id,
                        principal = %principal,
                        role = %role,
                        error = %err,
                        "role lookup failed; treating role as not held"
                    );
                }
            }
        }

        tracing::info!(
            path = %ctx.path,
            operation = %ctx.operation_id,
            principal = %principal,
            required = ?policy.required_roles,
            reason = "no_required_role",
            "access denied"
        );
        Outcome::RedirectToAccessDenied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::directory::InMemoryRoleDirectory;
    use crate::authz::Role;
    use crate::errors::DirectoryError;
    use async_trait::async_trait;

    /// Fails every lookup that touches `broken_role`; delegates the rest.
    struct PartiallyBroken {
        inner: InMemoryRoleDirectory,
        broken_role: &'static str,
    }

    #[async_trait]
    impl RoleDirectory for PartiallyBroken {
        async fn has_role(&self, principal_id: &str, role: &str) -> Result<bool, DirectoryError> {
            if role == self.broken_role {
                return Err(DirectoryError::unavailable("backend down"));
            }
            self.inner.has_role(principal_id, role).await
        }

        async fn list_principals_with_role(&self, role: &str) -> Result<Vec<String>, DirectoryError> {
            if role == self.broken_role {
                return Err(DirectoryError::unavailable("backend down"));
            }
            self.inner.list_principals_with_role(role).await
        }

        async fn list_roles(&self, principal_id: &str) -> Result<Vec<String>, DirectoryError> {
            self.inner.list_roles(principal_id).await
        }
    }

    /// Never answers.
    struct Stalled;

    #[async_trait]
    impl RoleDirectory for Stalled {
        async fn has_role(&self, _: &str, _: &str) -> Result<bool, DirectoryError> {
            std::future::pending().await
        }

        async fn list_principals_with_role(&self, _: &str) -> Result<Vec<String>, DirectoryError> {
            std::future::pending().await
        }

        async fn list_roles(&self, _: &str) -> Result<Vec<String>, DirectoryError> {
            std::future::pending().await
        }
    }

    const MAINTENANCE: &str = "GET /maintenance";
    const APPROVE: &str = "POST /bookings/:id/approve";
    const OPERATOR_ONLY: &str = "POST /usage";

    fn registry() -> Arc<PolicyRegistry> {
        let mut registry = PolicyRegistry::new();
        registry
            .allow_anonymous("GET /account/login")
            .require_roles(MAINTENANCE, [Role::Msd])
            .require_roles(APPROVE, [Role::Admin, Role::Pic])
            .require_roles(OPERATOR_ONLY, [Role::Operator]);
        Arc::new(registry)
    }

    fn engine(directory: Arc<dyn RoleDirectory>) -> AuthorizationEngine {
        AuthorizationEngine::new(
            registry(),
            directory,
            SuperAdminRoster::new(["pic1"]),
            Duration::from_millis(200),
        )
    }

    fn request(identity: Identity, operation: &str) -> RequestContext {
        RequestContext::new(identity, operation, "/some/path")
    }

    #[tokio::test]
    async fn anonymous_endpoints_allow_everyone() {
        let engine = engine(Arc::new(InMemoryRoleDirectory::new()));

        let declared = request(Identity::anonymous(), "GET /account/login");
        assert_eq!(engine.evaluate(&declared).await, Outcome::Allow);

        let marked = request(Identity::anonymous(), MAINTENANCE).anonymous_allowed();
        assert_eq!(engine.evaluate(&marked).await, Outcome::Allow);
    }

    #[tokio::test]
    async fn unauthenticated_redirects_with_return_url() {
        let engine = engine(Arc::new(InMemoryRoleDirectory::new()));

        let ctx = RequestContext::new(Identity::anonymous(), MAINTENANCE, "/maintenance").with_query("week=12");
        assert_eq!(
            engine.evaluate(&ctx).await,
            Outcome::RedirectToLogin {
                return_url: "/maintenance?week=12".to_string()
            }
        );

        let ctx = RequestContext::new(Identity::anonymous(), "GET /dashboard", "/dashboard");
        assert_eq!(
            engine.evaluate(&ctx).await,
            Outcome::RedirectToLogin {
                return_url: "/dashboard".to_string()
            }
        );
    }

    #[tokio::test]
    async fn super_admin_bypass_ends_once_an_admin_exists() {
        let directory = Arc::new(InMemoryRoleDirectory::new());
        let engine = engine(directory.clone());
        let ctx = request(Identity::authenticated("pic1"), MAINTENANCE);

        assert_eq!(engine.evaluate(&ctx).await, Outcome::Allow);

        directory.assign("alice", "admin").await;
        assert_eq!(engine.evaluate(&ctx).await, Outcome::RedirectToAccessDenied);
    }

    #[tokio::test]
    async fn super_admin_never_skips_authentication() {
        let engine = engine(Arc::new(InMemoryRoleDirectory::new()));
        let identity = Identity {
            is_authenticated: false,
            principal_id: Some("pic1".to_string()),
        };
        let outcome = engine.evaluate(&request(identity, MAINTENANCE)).await;
        assert!(matches!(outcome, Outcome::RedirectToLogin { .. }));
    }

    #[tokio::test]
    async fn authenticated_is_enough_without_required_roles() {
        let engine = engine(Arc::new(InMemoryRoleDirectory::new()));
        let ctx = request(Identity::authenticated_without_principal(), "GET /dashboard");
        assert_eq!(engine.evaluate(&ctx).await, Outcome::Allow);
    }

    #[tokio::test]
    async fn missing_principal_is_denied_not_redirected_to_login() {
        let engine = engine(Arc::new(InMemoryRoleDirectory::new()));
        let ctx = request(Identity::authenticated_without_principal(), OPERATOR_ONLY);
        assert_eq!(engine.evaluate(&ctx).await, Outcome::RedirectToAccessDenied);
    }

    #[tokio::test]
    async fn any_one_required_role_suffices() {
        let directory = Arc::new(InMemoryRoleDirectory::new());
        directory.assign("alice", "admin").await;
        directory.assign("bob", "pic").await;
        let engine = engine(directory);

        for who in ["alice", "bob"] {
            let ctx = request(Identity::authenticated(who), APPROVE);
            assert_eq!(engine.evaluate(&ctx).await, Outcome::Allow, "{who} should be allowed");
        }

        let ctx = request(Identity::authenticated("carol"), APPROVE);
        assert_eq!(engine.evaluate(&ctx).await, Outcome::RedirectToAccessDenied);
    }

    #[tokio::test]
    async fn failing_role_lookup_does_not_stop_remaining_roles() {
        let inner = InMemoryRoleDirectory::new();
        inner.assign("bob", "pic").await;
        let engine = engine(Arc::new(PartiallyBroken {
            inner,
            broken_role: "admin",
        }));

        let ctx = request(Identity::authenticated("bob"), APPROVE);
        assert_eq!(engine.evaluate(&ctx).await, Outcome::Allow);

        let ctx = request(Identity::authenticated("carol"), APPROVE);
        assert_eq!(engine.evaluate(&ctx).await, Outcome::RedirectToAccessDenied);
    }

    #[tokio::test]
    async fn super_admin_falls_through_when_admin_lookup_fails() {
        let inner = InMemoryRoleDirectory::new();
        inner.assign("pic1", "msd").await;
        let engine = engine(Arc::new(PartiallyBroken {
            inner,
            broken_role: "admin",
        }));

        // Demoted, but still holds msd through the ordinary check.
        let ctx = request(Identity::authenticated("pic1"), MAINTENANCE);
        assert_eq!(engine.evaluate(&ctx).await, Outcome::Allow);

        let ctx = request(Identity::authenticated("pic1"), OPERATOR_ONLY);
        assert_eq!(engine.evaluate(&ctx).await, Outcome::RedirectToAccessDenied);
    }

    #[tokio::test]
    async fn stalled_directory_times_out_to_denial() {
        let engine = engine(Arc::new(Stalled));

        let ctx = request(Identity::authenticated("pic1"), MAINTENANCE);
        assert_eq!(engine.evaluate(&ctx).await, Outcome::RedirectToAccessDenied);

        let ctx = request(Identity::authenticated("alice"), "GET /dashboard");
        assert_eq!(engine.evaluate(&ctx).await, Outcome::Allow);
    }
}
