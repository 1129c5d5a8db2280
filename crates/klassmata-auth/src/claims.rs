//! JWT claim structures for session tokens.

use klassmata_models::{Role, SchoolId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Claims embedded in a session token.
///
/// The role is carried as its snake_case name so that a token minted by an
/// older deployment with a role this build does not know still decodes; the
/// access gate then treats the unknown role as unmapped.
///
/// # Fields
///
/// - `sub`: User ID (subject)
/// - `email`: User's email address
/// - `role`: User role name
/// - `school_id`: Tenant scope (None for super admins without a school)
/// - `exp`: Token expiration timestamp
/// - `iat`: Token issued-at timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address
    pub email: String,
    /// Role name, e.g. `teacher`
    pub role: String,
    /// Tenant the user belongs to
    pub school_id: Option<Uuid>,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    /// Parsed role, or `None` when the claim names an unknown role.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }

    pub fn school_id(&self) -> Option<SchoolId> {
        self.school_id.map(SchoolId::from_uuid)
    }
}
