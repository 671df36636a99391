//! Authorization module - decision engine and routing hook
//!
//! This module decides, for every routed request, whether the caller may proceed:
//! - Per-operation role requirements (OR-combined) from a startup-built registry
//! - Role lookups through a pluggable, read-only role directory
//! - Bootstrap super-admin bypass that steps down once a real admin exists
//! - Fail-closed handling of directory errors and timeouts

mod directory;
mod evaluator;
pub mod middleware;
mod outcome;
mod policy;
mod principal;
mod roles;
mod sqlite;
mod trust;

pub use directory::{bounded, InMemoryRoleDirectory, RoleDirectory};
pub use evaluator::{AuthorizationEngine, RequestContext};
pub use outcome::{return_url, Outcome};
pub use policy::{OperationPolicy, PolicyRegistry};
pub use principal::{normalize_principal, Identity, REMOTE_USER_HEADER};
pub use roles::{Role, UnknownRole};
pub use sqlite::SqliteRoleDirectory;
pub use trust::{SuperAdminRoster, SuperAdminTrustEvaluator, TrustDecision, TrustState};
