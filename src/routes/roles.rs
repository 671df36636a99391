//! Read-only role endpoints. Assignment changes belong to the role-management tooling.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::app::AppState;
use crate::authz::{bounded, Identity, Role, TrustDecision, UnknownRole};
use crate::errors::{AppError, AppResult};
use crate::models::role_assignment::RoleAssignment;

#[derive(Debug, Serialize)]
pub struct RoleInfo {
    pub name: Role,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MyAuthorization {
    pub principal: Option<String>,
    pub roles: Vec<String>,
    pub super_admin: TrustDecision,
}

/// Static role catalog.
pub async fn list_roles() -> Json<Vec<RoleInfo>> {
    Json(
        Role::ALL
            .into_iter()
            .map(|role| RoleInfo {
                name: role,
                description: role.description(),
            })
            .collect(),
    )
}

pub async fn role_holders(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> AppResult<Json<Vec<RoleAssignment>>> {
    let role: Role = role
        .parse()
        .map_err(|err: UnknownRole| AppError::not_found(err.to_string()))?;

    let rows = bounded(
        state.config.directory_timeout,
        state.directory.assignments_for_role(role.as_str()),
    )
    .await?;

    Ok(Json(rows))
}

/// The caller's roles and current super-admin standing.
pub async fn my_authorization(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Json<MyAuthorization>> {
    let principal = identity.principal().map(String::from);

    let roles = match principal.as_deref() {
        Some(p) => bounded(state.config.directory_timeout, state.engine.directory().list_roles(p)).await?,
        None => Vec::new(),
    };
    let super_admin = state.engine.trust().evaluate(principal.as_deref()).await;

    Ok(Json(MyAuthorization {
        principal,
        roles,
        super_admin,
    }))
}
