use serde::Serialize;

/// Result of one authorization evaluation, consumed by the routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Allow,
    RedirectToLogin { return_url: String },
    RedirectToAccessDenied,
}

impl Outcome {
    /// Redirect target for non-allow outcomes.
    pub fn location(&self, login_path: &str, access_denied_path: &str) -> Option<String> {
        match self {
            Outcome::Allow => None,
            Outcome::RedirectToLogin { return_url } => Some(format!(
                "{login_path}?returnUrl={}",
                urlencoding::encode(return_url)
            )),
            Outcome::RedirectToAccessDenied => Some(access_denied_path.to_string()),
        }
    }
}

/// `path` followed by `?query`, omitting an empty query.
pub fn return_url(path: &str, query: Option<&str>) -> String {
    match query.map(|q| q.trim_start_matches('?')).filter(|q| !q.is_empty()) {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}
