use axum::extract::{MatchedPath, OriginalUri, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use super::evaluator::RequestContext;
use super::principal::Identity;
use crate::app::AppState;

/// Operation id for a request: `"{METHOD} {route template}"`.
pub fn operation_id(request: &Request) -> String {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    format!("{} {}", request.method(), route)
}

/// Authorization hook run before every routed handler.
///
/// Install with `route_layer` so the matched route template is available.
pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let identity = request
        .extensions()
        .get::<Identity>()
        .cloned()
        .unwrap_or_else(|| Identity::from_headers(request.headers()));

    // nested routers strip their prefix from `uri()`
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| request.uri().clone());

    let mut ctx = RequestContext::new(identity, operation_id(&request), uri.path());
    if let Some(query) = uri.query() {
        ctx = ctx.with_query(query);
    }

    let outcome = state.engine.evaluate(&ctx).await;
    match outcome.location(&state.config.login_path, &state.config.access_denied_path) {
        None => next.run(request).await,
        Some(location) => Redirect::to(&location).into_response(),
    }
}
