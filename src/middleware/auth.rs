use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::CookieJar;
use klassmata_auth::{Claims, verify_token};
use klassmata_config::JwtConfig;
use klassmata_core::AppError;
use klassmata_models::{Role, SchoolId, UserId};

use crate::state::AppState;

/// Name of the cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "klassmata_session";

/// The authenticated caller, decoded from the session token.
///
/// The access gate stores it in request extensions; handlers receive it
/// through this extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// `None` when the token carries a role this build does not know.
    pub fn role(&self) -> Option<Role> {
        self.0.role()
    }

    pub fn school_id(&self) -> Option<SchoolId> {
        self.0.school_id()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.0.user_id()
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

/// Raw session token: `Authorization: Bearer` wins over the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Decodes the caller's session. Missing, malformed and expired tokens all
/// read as no session.
pub fn decode_session(headers: &HeaderMap, jwt_config: &JwtConfig) -> Option<AuthUser> {
    let token = session_token(headers)?;
    verify_token(&token, jwt_config).ok().map(AuthUser)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = session_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("Missing session token"))?;
        let claims = verify_token(&token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}
