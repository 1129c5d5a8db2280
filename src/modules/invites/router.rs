use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    cancel_invite, create_invite, list_invites, redeem_invite, validate_invite,
};

/// Admin invite management, nested under `/api/admin/invites`.
pub fn init_admin_invites_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_invite).get(list_invites))
        .route("/{id}", delete(cancel_invite))
}

/// Public invite lookup and redemption, nested under `/api/invites`.
pub fn init_public_invites_router() -> Router<AppState> {
    Router::new()
        .route("/redeem", post(redeem_invite))
        .route("/{code}", get(validate_invite))
}
