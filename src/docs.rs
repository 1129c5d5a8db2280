use klassmata_core::ErrorResponse;
use klassmata_models::{
    CreateInviteRequest, CreateInviteResponse, EffectiveStatus, InviteDetails, InviteSummary,
    LoginRequest, LoginResponse, RedeemInviteRequest, RedeemInviteResponse, Role,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::health::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::health_check,
        crate::modules::auth::controller::login_user,
        crate::modules::invites::controller::create_invite,
        crate::modules::invites::controller::list_invites,
        crate::modules::invites::controller::cancel_invite,
        crate::modules::invites::controller::validate_invite,
        crate::modules::invites::controller::redeem_invite,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            Role,
            LoginRequest,
            LoginResponse,
            CreateInviteRequest,
            CreateInviteResponse,
            EffectiveStatus,
            InviteSummary,
            InviteDetails,
            RedeemInviteRequest,
            RedeemInviteResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Authentication", description = "User authentication endpoints"),
        (name = "Invites", description = "Teacher invite lifecycle")
    ),
    info(
        title = "KlassMata API",
        version = "0.1.0",
        description = "Teacher onboarding by invite code, with role-based access to school dashboards.",
        contact(
            name = "API Support",
            email = "support@klassmata.com"
        ),
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
