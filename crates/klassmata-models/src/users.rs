//! User accounts, schools and login DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{SchoolId, UserId};
use crate::roles::Role;
use crate::value_types::Email;

/// A user account. The password hash never leaves [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserAccount {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub school_id: Option<SchoolId>,
    pub created_at: DateTime<Utc>,
}

/// Login lookup row.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
    pub school_id: Option<SchoolId>,
    pub password_hash: String,
}

/// A school is the tenant boundary: every admin, teacher and invite belongs to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// New account data handed to the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub school_id: Option<SchoolId>,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub role: Role,
    /// Dashboard the client should navigate to after signing in.
    pub redirect_to: String,
}
