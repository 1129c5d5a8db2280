use klassmata_auth::create_access_token;
use klassmata_config::JwtConfig;
use klassmata_core::{AppError, verify_password_async};
use klassmata_db::{InviteStore, StoreError};
use klassmata_models::{Email, LoginRequest, LoginResponse};
use klassmata_observability::{
    track_jwt_issued, track_user_login_failure, track_user_login_success,
};
use tracing::{info, instrument, warn};

use crate::middleware::access::dashboard_for;

pub struct AuthService;

impl AuthService {
    #[instrument(skip(store, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login_user(
        store: &dyn InviteStore,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let invalid = || AppError::unauthorized("Invalid email or password");

        let email = Email::new(&dto.email).map_err(|_| invalid())?;

        let Some(credentials) = store
            .find_credentials_by_email(&email)
            .await
            .map_err(StoreError::into_app_error)?
        else {
            track_user_login_failure("unknown_email");
            warn!("Login failed: unknown email");
            return Err(invalid());
        };

        if !verify_password_async(dto.password, credentials.password_hash.clone()).await? {
            track_user_login_failure("invalid_password");
            warn!(user.id = %credentials.id, "Login failed: invalid password");
            return Err(invalid());
        }

        let access_token = create_access_token(
            credentials.id,
            &credentials.email,
            credentials.role,
            credentials.school_id,
            jwt_config,
        )?;
        track_jwt_issued();
        track_user_login_success(credentials.role.as_str());
        info!(user.id = %credentials.id, role = %credentials.role, "User logged in");

        Ok(LoginResponse {
            access_token,
            role: credentials.role,
            redirect_to: dashboard_for(credentials.role).to_string(),
        })
    }
}
