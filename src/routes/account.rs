//! Landing points for authorization redirects.
//!
//! Credential handling lives in the upstream identity provider; these handlers
//! only tell the client where it ended up and why.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::authz::Identity;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequired {
    pub message: &'static str,
    #[serde(rename = "returnUrl", skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessDenied {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
}

pub async fn login(Query(query): Query<LoginQuery>) -> (StatusCode, Json<LoginRequired>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(LoginRequired {
            message: "sign in through the identity provider to continue",
            return_url: query.return_url,
        }),
    )
}

pub async fn access_denied(identity: Identity) -> (StatusCode, Json<AccessDenied>) {
    (
        StatusCode::FORBIDDEN,
        Json(AccessDenied {
            message: "you do not hold a role that permits this operation",
            principal: identity.principal().map(String::from),
        }),
    )
}
