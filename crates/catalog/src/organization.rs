use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursehub_core::OrganizationId;

use crate::course::Bilingual;

/// Contact details for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
}

/// Geographic coordinates of the organization's office.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Tenant record owning courses and organization-admin users.
///
/// # Invariants
/// - Cannot be deleted while it owns any course or user (enforced by the
///   store's guarded delete).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: Bilingual,
    pub description: Bilingual,
    pub contact: ContactInfo,
    pub location: Option<GeoPoint>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
