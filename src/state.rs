use std::sync::Arc;

use klassmata_config::{CorsConfig, EmailConfig, InviteConfig, JwtConfig};
use klassmata_db::InviteStore;

use crate::modules::invites::service::InviteService;
use crate::utils::email::{Mailer, mailer_from_config};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InviteStore>,
    pub invites: InviteService,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
}

impl AppState {
    /// Wires the state from an already opened store and a mailer.
    pub fn new(
        store: Arc<dyn InviteStore>,
        mailer: Arc<dyn Mailer>,
        jwt_config: JwtConfig,
        email_config: &EmailConfig,
        invite_config: InviteConfig,
        cors_config: CorsConfig,
    ) -> Self {
        let invites = InviteService::new(
            store.clone(),
            mailer,
            invite_config,
            email_config.frontend_url.clone(),
        );

        Self {
            store,
            invites,
            jwt_config,
            cors_config,
        }
    }

    /// State for `store` with every other setting read from the environment.
    pub fn from_env(store: Arc<dyn InviteStore>) -> Self {
        let email_config = EmailConfig::from_env();
        let mailer = mailer_from_config(&email_config);

        Self::new(
            store,
            mailer,
            JwtConfig::from_env(),
            &email_config,
            InviteConfig::from_env(),
            CorsConfig::from_env(),
        )
    }
}
