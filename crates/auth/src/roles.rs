use serde::{Deserialize, Serialize};

/// Role of an authenticated user.
///
/// Roles form a closed set; authorization decisions are made by the single
/// predicate in [`crate::guard`], never by comparing role strings at call
/// sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Unconditional system-wide authority.
    PlatformAdmin,
    /// Scoped to a single owning organization.
    OrganizationAdmin,
    /// Individual content contributor, scoped to their own authored resources.
    YouthAdvocate,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PlatformAdmin => "PLATFORM_ADMIN",
            Role::OrganizationAdmin => "ORGANIZATION_ADMIN",
            Role::YouthAdvocate => "YOUTH_ADVOCATE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PLATFORM_ADMIN" => Some(Role::PlatformAdmin),
            "ORGANIZATION_ADMIN" => Some(Role::OrganizationAdmin),
            "YOUTH_ADVOCATE" => Some(Role::YouthAdvocate),
            _ => None,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
