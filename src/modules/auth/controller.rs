use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use klassmata_core::{AppError, ErrorResponse};
use klassmata_models::{LoginRequest, LoginResponse};
use tracing::instrument;

use super::service::AuthService;
use crate::middleware::auth::SESSION_COOKIE;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Sign in and receive a session token.
///
/// The token is returned in the body and also set as the `klassmata_session`
/// cookie for browser clients.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Bad request - validation error", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let response = AuthService::login_user(state.store.as_ref(), dto, &state.jwt_config).await?;

    let cookie = Cookie::build((SESSION_COOKIE, response.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Json(response)))
}
