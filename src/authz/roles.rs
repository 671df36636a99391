use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Well-known roles recognised by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Pic,
    Msd,
    Operator,
    Billing,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Admin, Role::Pic, Role::Msd, Role::Operator, Role::Billing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pic => "pic",
            Role::Msd => "msd",
            Role::Operator => "operator",
            Role::Billing => "billing",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Full administrative access, including role assignment review",
            Role::Pic => "Person in charge: approves bookings and oversees day-to-day operations",
            Role::Msd => "Maintenance services: manages maintenance schedules and work orders",
            Role::Operator => "Operates bookings and records usage",
            Role::Billing => "Prepares and reviews invoices",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
