use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use klassmata_core::{AppError, ErrorResponse};
use klassmata_models::{
    CreateInviteRequest, CreateInviteResponse, InviteDetails, InviteId, InviteSummary,
    RedeemInviteRequest, RedeemInviteResponse,
};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Invite a teacher to the caller's school
#[utoipa::path(
    post,
    path = "/api/admin/invites",
    request_body = CreateInviteRequest,
    responses(
        (status = 201, description = "Invite created", body = CreateInviteResponse),
        (status = 400, description = "Bad request - validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 409, description = "Account or pending invite already exists", body = ErrorResponse)
    ),
    tag = "Invites",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_invite(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateInviteRequest>,
) -> Result<(StatusCode, Json<CreateInviteResponse>), AppError> {
    let invite = state.invites.create_invite(&auth_user, dto).await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

/// List the caller's school invites, newest first
#[utoipa::path(
    get,
    path = "/api/admin/invites",
    responses(
        (status = 200, description = "Invites of the caller's school", body = Vec<InviteSummary>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    tag = "Invites",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn list_invites(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<InviteSummary>>, AppError> {
    let invites = state.invites.list_invites(&auth_user).await?;
    Ok(Json(invites))
}

/// Cancel a pending invite
#[utoipa::path(
    delete,
    path = "/api/admin/invites/{id}",
    params(
        ("id" = InviteId, Path, description = "Invite ID")
    ),
    responses(
        (status = 200, description = "Invite cancelled", body = InviteSummary),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Invite belongs to another school", body = ErrorResponse),
        (status = 404, description = "Invite not found", body = ErrorResponse),
        (status = 409, description = "Invite was already accepted", body = ErrorResponse)
    ),
    tag = "Invites",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn cancel_invite(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<InviteId>,
) -> Result<Json<InviteSummary>, AppError> {
    let invite = state.invites.cancel_invite(&auth_user, id).await?;
    Ok(Json(invite))
}

/// Look up an invite by code before signing up
#[utoipa::path(
    get,
    path = "/api/invites/{code}",
    params(
        ("code" = String, Path, description = "Invite code")
    ),
    responses(
        (status = 200, description = "Invite is valid", body = InviteDetails),
        (status = 404, description = "Invite not found", body = ErrorResponse),
        (status = 409, description = "Invite has already been used", body = ErrorResponse),
        (status = 410, description = "Invite has expired", body = ErrorResponse)
    ),
    tag = "Invites"
)]
#[instrument(skip(state, code))]
pub async fn validate_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<InviteDetails>, AppError> {
    let details = state.invites.validate_invite(&code).await?;
    Ok(Json(details))
}

/// Redeem an invite code and create a teacher account
#[utoipa::path(
    post,
    path = "/api/invites/redeem",
    request_body = RedeemInviteRequest,
    responses(
        (status = 201, description = "Teacher account created", body = RedeemInviteResponse),
        (status = 400, description = "Password too short", body = ErrorResponse),
        (status = 404, description = "Invite not found", body = ErrorResponse),
        (status = 409, description = "Invite used or email already registered", body = ErrorResponse),
        (status = 410, description = "Invite has expired", body = ErrorResponse)
    ),
    tag = "Invites"
)]
#[instrument(skip(state, dto))]
pub async fn redeem_invite(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RedeemInviteRequest>,
) -> Result<(StatusCode, Json<RedeemInviteResponse>), AppError> {
    let response = state.invites.redeem_invite(dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
