//! JWT creation and verification for session tokens.
//!
//! Tokens are HS256-signed with `JWT_SECRET` and expire after
//! `JWT_ACCESS_EXPIRY` seconds.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use klassmata_config::JwtConfig;
use klassmata_core::AppError;
use klassmata_models::{Email, Role, SchoolId, UserId};

use crate::claims::Claims;

/// Creates a session token for a signed-in user.
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_access_token(
    user_id: UserId,
    email: &Email,
    role: Role,
    school_id: Option<SchoolId>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry.max(0) as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.as_str().to_string(),
        role: role.as_str().to_string(),
        school_id: school_id.map(SchoolId::into_inner),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies a session token's signature and expiry and returns its claims.
///
/// # Errors
///
/// Returns an unauthorized error if the token is malformed, expired or
/// signed with a different secret.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}
