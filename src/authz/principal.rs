use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

/// Header set by the authenticating reverse proxy in front of the app.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

/// The caller of a request, as established by the authentication layer.
///
/// `principal_id` is the directory username. It can be absent even when the
/// caller is authenticated (e.g. a service session with no directory entry).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub is_authenticated: bool,
    pub principal_id: Option<String>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal_id: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            principal_id: Some(principal_id.into()),
        }
    }

    /// Authenticated session that carries no directory identity.
    pub fn authenticated_without_principal() -> Self {
        Self {
            is_authenticated: true,
            principal_id: None,
        }
    }

    /// Principal id if present and not blank.
    pub fn principal(&self) -> Option<&str> {
        self.principal_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(REMOTE_USER_HEADER) {
            None => Self::anonymous(),
            Some(value) => {
                let principal = value
                    .to_str()
                    .ok()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from);
                Self {
                    is_authenticated: true,
                    principal_id: principal,
                }
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }
        Ok(Identity::from_headers(&parts.headers))
    }
}

/// Canonical form used when comparing principal identifiers.
///
/// Case folding is ASCII-only so it agrees with SQLite's `LOWER`.
pub fn normalize_principal(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}
