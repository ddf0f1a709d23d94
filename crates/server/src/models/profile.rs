//! Profile and authenticated-principal models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use attar_core::{Email, Role, UserId};

/// A customer or admin profile.
///
/// One row per authenticated user, created on signup and updated by the
/// owning user.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The principal resolved from a bearer token.
///
/// Handlers compare this against the resource owner referenced in the
/// payload; a mismatch is a 403 regardless of payload validity.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
}

impl CurrentUser {
    /// Whether the principal holds the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
