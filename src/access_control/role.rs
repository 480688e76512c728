//! Application roles

use serde::Serialize;
use std::fmt;

/// Role stored on a user's profile
///
/// Closed set. Anything missing or unrecognized is treated as `Resident`,
/// the least privileged role, so a typo in the profiles table can never
/// grant admin access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Resident,
    Admin,
    Collector,
    FacilityManager,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Resident => "resident",
            Role::Admin => "admin",
            Role::Collector => "collector",
            Role::FacilityManager => "facility_manager",
        }
    }

    /// Try to parse a role from its stored value (exact, lowercase)
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "resident" => Some(Role::Resident),
            "admin" => Some(Role::Admin),
            "collector" => Some(Role::Collector),
            "facility_manager" => Some(Role::FacilityManager),
            _ => None,
        }
    }

    /// Parse a stored value, defaulting to `Resident`
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(Self::try_parse).unwrap_or_default()
    }

    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn all() -> &'static [Role] {
        &[
            Role::Resident,
            Role::Admin,
            Role::Collector,
            Role::FacilityManager,
        ]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
