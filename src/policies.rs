//! Operation -> policy table for the routes served by [`crate::app`].

use crate::authz::{PolicyRegistry, Role};
use crate::config::AuthzConfig;

pub const HEALTH: &str = "GET /api/health";
pub const MY_AUTHZ: &str = "GET /me/authz";
pub const ROLE_CATALOG: &str = "GET /roles";
pub const ROLE_HOLDERS: &str = "GET /roles/:role/holders";

/// Operation id of a `GET` landing page mounted at `path`.
pub fn landing_operation(path: &str) -> String {
    format!("GET {path}")
}

pub fn default_registry(config: &AuthzConfig) -> PolicyRegistry {
    let mut registry = PolicyRegistry::new();

    registry
        .allow_anonymous(HEALTH)
        .allow_anonymous(landing_operation(&config.login_path))
        .allow_anonymous(landing_operation(&config.access_denied_path));

    // MY_AUTHZ and ROLE_CATALOG only need an authenticated caller.

    registry
        .require_roles(ROLE_HOLDERS, [Role::Admin])
        .require_roles(ROLE_HOLDERS, [Role::Pic]);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_pages_are_anonymous() {
        let registry = default_registry(&AuthzConfig::default());
        for op in [HEALTH, "GET /account/login", "GET /account/access-denied"] {
            assert!(registry.resolve(op).allow_anonymous, "{op} must be anonymous");
        }
    }

    #[test]
    fn landing_pages_follow_configured_paths() {
        let config = AuthzConfig {
            login_path: "/sso/start".to_string(),
            access_denied_path: "/sso/forbidden".to_string(),
            ..AuthzConfig::default()
        };
        let registry = default_registry(&config);
        assert!(registry.resolve("GET /sso/start").allow_anonymous);
        assert!(registry.resolve("GET /sso/forbidden").allow_anonymous);
        assert!(!registry.resolve("GET /account/login").allow_anonymous);
    }

    #[test]
    fn holders_require_admin_or_pic() {
        let registry = default_registry(&AuthzConfig::default());
        let policy = registry.resolve(ROLE_HOLDERS);
        assert!(!policy.allow_anonymous);
        assert!(policy.required_roles.contains("admin"));
        assert!(policy.required_roles.contains("pic"));
        assert!(registry.resolve(MY_AUTHZ).required_roles.is_empty());
    }
}
