use std::time::Duration;

use crate::authz::SuperAdminRoster;
use crate::errors::AppError;

pub const DEFAULT_DIRECTORY_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_LOGIN_PATH: &str = "/account/login";
pub const DEFAULT_ACCESS_DENIED_PATH: &str = "/account/access-denied";

#[derive(Debug, Clone)]
pub struct AuthzConfig {
    pub super_admins: SuperAdminRoster,
    pub directory_timeout: Duration,
    pub login_path: String,
    pub access_denied_path: String,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            super_admins: SuperAdminRoster::default(),
            directory_timeout: Duration::from_millis(DEFAULT_DIRECTORY_TIMEOUT_MS),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            access_denied_path: DEFAULT_ACCESS_DENIED_PATH.to_string(),
        }
    }
}

impl AuthzConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; absent keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let super_admins = lookup("AUTHZ_SUPER_ADMINS")
            .map(|raw| SuperAdminRoster::parse(&raw))
            .unwrap_or_default();

        let directory_timeout = match lookup("AUTHZ_DIRECTORY_TIMEOUT_MS") {
            None => defaults.directory_timeout,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(AppError::configuration(
                        "AUTHZ_DIRECTORY_TIMEOUT_MS must be a positive integer",
                    ))
                }
            },
        };

        let login_path = landing_path(lookup("AUTHZ_LOGIN_PATH"), defaults.login_path, "AUTHZ_LOGIN_PATH")?;
        let access_denied_path = landing_path(
            lookup("AUTHZ_ACCESS_DENIED_PATH"),
            defaults.access_denied_path,
            "AUTHZ_ACCESS_DENIED_PATH",
        )?;
        if login_path == access_denied_path {
            return Err(AppError::configuration(
                "AUTHZ_LOGIN_PATH and AUTHZ_ACCESS_DENIED_PATH must differ",
            ));
        }

        Ok(Self {
            super_admins,
            directory_timeout,
            login_path,
            access_denied_path,
        })
    }

    pub fn with_super_admins(mut self, roster: SuperAdminRoster) -> Self {
        self.super_admins = roster;
        self
    }
}

/// Landing pages are mounted as literal routes, so the path must be absolute
/// and free of query strings and route parameters.
fn landing_path(raw: Option<String>, default: String, key: &str) -> Result<String, AppError> {
    let Some(path) = raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    let literal = path.starts_with('/') && !path.contains(&['?', '#', ':', '*', '{', '}'][..]);
    if !literal {
        return Err(AppError::configuration(format!("{key} must be a literal absolute path")));
    }
    Ok(path)
}
