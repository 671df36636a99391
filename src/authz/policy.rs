use std::collections::{BTreeSet, HashMap};

/// Authorization requirements declared for one operation.
///
/// Required roles are OR-combined: holding any one of them suffices. An empty
/// set means "authenticated is enough".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationPolicy {
    pub allow_anonymous: bool,
    pub required_roles: BTreeSet<String>,
}

impl OperationPolicy {
    pub fn anonymous() -> Self {
        Self {
            allow_anonymous: true,
            required_roles: BTreeSet::new(),
        }
    }

    pub fn with_roles<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            allow_anonymous: false,
            required_roles: roles.into_iter().map(|r| r.into().trim().to_ascii_lowercase()).collect(),
        }
    }

    fn merge(&mut self, other: OperationPolicy) {
        self.allow_anonymous |= other.allow_anonymous;
        self.required_roles.extend(other.required_roles);
    }
}

/// Operation id -> declared policy. Built during startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, OperationPolicy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration for `operation_id`. Repeated declarations accumulate.
    pub fn register(&mut self, operation_id: impl Into<String>, policy: OperationPolicy) -> &mut Self {
        self.policies
            .entry(operation_id.into())
            .or_default()
            .merge(policy);
        self
    }

    pub fn allow_anonymous(&mut self, operation_id: impl Into<String>) -> &mut Self {
        self.register(operation_id, OperationPolicy::anonymous())
    }

    pub fn require_roles<I, R>(&mut self, operation_id: impl Into<String>, roles: I) -> &mut Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.register(operation_id, OperationPolicy::with_roles(roles))
    }

    /// Declared policy, or the authenticated-only default when nothing was declared.
    pub fn resolve(&self, operation_id: &str) -> OperationPolicy {
        self.policies.get(operation_id).cloned().unwrap_or_default()
    }

    pub fn operations(&self) -> impl Iterator<Item = (&str, &OperationPolicy)> {
        self.policies.iter().map(|(op, policy)| (op.as_str(), policy))
    }
}
