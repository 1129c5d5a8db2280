use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use klassmata_config::InviteConfig;
use klassmata_core::{AppError, MIN_PASSWORD_LENGTH, hash_password_async};
use klassmata_db::{InviteStore, NewInvite, StoreError};
use klassmata_models::{
    CreateInviteRequest, CreateInviteResponse, Email, InviteDetails, InviteId, InviteRecord,
    InviteStatus, InviteSummary, RedeemInviteRequest, RedeemInviteResponse, SchoolId,
};
use klassmata_observability::{
    track_invite_cancelled, track_invite_created, track_invite_email, track_invite_redeemed,
};
use tracing::{info, instrument, warn};

use super::code::{generate_invite_code, normalize_code};
use crate::middleware::auth::AuthUser;
use crate::utils::email::{InviteEmail, Mailer};

const MAX_CODE_ATTEMPTS: usize = 3;

/// Invite lifecycle operations. Every privileged operation takes the caller
/// explicitly.
#[derive(Clone)]
pub struct InviteService {
    store: Arc<dyn InviteStore>,
    mailer: Arc<dyn Mailer>,
    config: InviteConfig,
    frontend_url: String,
}

fn require_admin(requester: &AuthUser) -> Result<(), AppError> {
    match requester.role() {
        Some(role) if role.is_admin() => Ok(()),
        _ => Err(AppError::forbidden(
            "Only school administrators can manage invites",
        )),
    }
}

fn require_school(requester: &AuthUser) -> Result<SchoolId, AppError> {
    requester
        .school_id()
        .ok_or_else(|| AppError::bad_request(anyhow!("Your account is not associated with a school")))
}

fn expiry_from(now: DateTime<Utc>, ttl_days: i64) -> Result<DateTime<Utc>, AppError> {
    Duration::try_days(ttl_days)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::internal_error("Invite lifetime is out of range"))
}

/// The three redemption preconditions, in the order they are reported.
fn ensure_redeemable(invite: &InviteRecord, now: DateTime<Utc>) -> Result<(), AppError> {
    if invite.status != InviteStatus::Pending {
        return Err(AppError::conflict(anyhow!("Invite has already been used")));
    }
    if invite.is_expired(now) {
        return Err(AppError::gone(anyhow!("Invite has expired")));
    }
    Ok(())
}

impl InviteService {
    pub fn new(
        store: Arc<dyn InviteStore>,
        mailer: Arc<dyn Mailer>,
        config: InviteConfig,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            config,
            frontend_url: frontend_url.into(),
        }
    }

    #[instrument(skip(self, requester, dto), fields(user.id = %requester.0.sub))]
    pub async fn create_invite(
        &self,
        requester: &AuthUser,
        dto: CreateInviteRequest,
    ) -> Result<CreateInviteResponse, AppError> {
        require_admin(requester)?;
        let school_id = require_school(requester)?;
        let school = self
            .store
            .find_school(school_id)
            .await
            .map_err(StoreError::into_app_error)?
            .ok_or_else(|| AppError::bad_request(anyhow!("Your school no longer exists")))?;

        let email = Email::new(&dto.email)
            .map_err(|_| AppError::bad_request(anyhow!("email must be a valid email address")))?;
        let (first_name, last_name) = dto.resolve_names().ok_or_else(|| {
            AppError::bad_request(anyhow!("firstName and lastName (or name) are required"))
        })?;

        if self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(StoreError::into_app_error)?
            .is_some()
        {
            return Err(AppError::conflict(anyhow!(
                "A user with this email already exists"
            )));
        }

        let now = Utc::now();

        if let Some(existing) = self
            .store
            .find_pending_invite(school_id, &email)
            .await
            .map_err(StoreError::into_app_error)?
        {
            if !existing.is_expired(now) {
                return Err(AppError::conflict(anyhow!(
                    "A pending invite already exists for this email"
                )));
            }
            self.store
                .cancel_invite(existing.id)
                .await
                .map_err(StoreError::into_app_error)?;
            info!(invite.id = %existing.id, "Superseded expired pending invite");
        }

        let expires_at = expiry_from(now, self.config.ttl_days)?;
        let new_invite = NewInvite {
            code: String::new(),
            email,
            first_name,
            last_name,
            subject: dto.subject(),
            school_id,
            invited_by: requester.user_id(),
            created_at: now,
            expires_at,
        };

        let invite = self.insert_with_fresh_code(new_invite).await?;
        track_invite_created();
        info!(invite.id = %invite.id, school.id = %school_id, "Invite created");

        let email_sent = self.dispatch_invite_email(&invite, &school.name).await;

        Ok(CreateInviteResponse {
            id: invite.id,
            code: invite.code,
            email_sent,
            expires_at: invite.expires_at,
        })
    }

    async fn insert_with_fresh_code(&self, invite: NewInvite) -> Result<InviteRecord, AppError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let attempt = NewInvite {
                code: generate_invite_code(),
                ..invite.clone()
            };
            match self.store.create_invite(attempt).await {
                Ok(record) => return Ok(record),
                Err(StoreError::CodeTaken) => {
                    warn!("Generated invite code collided, retrying");
                }
                Err(e) => return Err(e.into_app_error()),
            }
        }

        Err(AppError::internal_error(
            "Could not generate a unique invite code",
        ))
    }

    /// Sends the invitation under the configured timeout. Delivery problems
    /// are logged and reported as `false`; the invite stands either way.
    async fn dispatch_invite_email(&self, invite: &InviteRecord, school_name: &str) -> bool {
        let message = InviteEmail::render(
            &invite.first_name,
            school_name,
            &invite.code,
            &self.frontend_url,
            invite.expires_at,
        );

        let send = self.mailer.send(
            invite.email.as_str(),
            &message.subject,
            &message.html_body,
            &message.text_body,
        );

        let sent = match tokio::time::timeout(self.config.email_timeout, send).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(invite.id = %invite.id, error = %e, "Invite email not sent");
                false
            }
            Err(_) => {
                warn!(
                    invite.id = %invite.id,
                    timeout_secs = self.config.email_timeout.as_secs(),
                    "Invite email timed out"
                );
                false
            }
        };

        track_invite_email(sent);
        sent
    }

    #[instrument(skip(self, requester), fields(user.id = %requester.0.sub))]
    pub async fn list_invites(&self, requester: &AuthUser) -> Result<Vec<InviteSummary>, AppError> {
        require_admin(requester)?;
        let school_id = require_school(requester)?;

        let now = Utc::now();
        let invites = self
            .store
            .list_invites(school_id)
            .await
            .map_err(StoreError::into_app_error)?;

        Ok(invites.iter().map(|i| i.to_summary(now)).collect())
    }

    #[instrument(skip(self, requester), fields(user.id = %requester.0.sub))]
    pub async fn cancel_invite(
        &self,
        requester: &AuthUser,
        invite_id: InviteId,
    ) -> Result<InviteSummary, AppError> {
        require_admin(requester)?;

        let invite = self
            .store
            .find_invite(invite_id)
            .await
            .map_err(StoreError::into_app_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("Invite not found")))?;

        if requester.school_id() != Some(invite.school_id) {
            return Err(AppError::forbidden(
                "You can only manage invites for your own school",
            ));
        }

        let cancelled = self
            .store
            .cancel_invite(invite_id)
            .await
            .map_err(StoreError::into_app_error)?;

        if invite.status == InviteStatus::Pending {
            track_invite_cancelled();
            info!(invite.id = %invite_id, "Invite cancelled");
        }

        Ok(cancelled.to_summary(Utc::now()))
    }

    async fn find_by_code(&self, code: &str) -> Result<InviteRecord, AppError> {
        self.store
            .find_invite_by_code(&normalize_code(code))
            .await
            .map_err(StoreError::into_app_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("Invite not found")))
    }

    #[instrument(skip(self, code))]
    pub async fn validate_invite(&self, code: &str) -> Result<InviteDetails, AppError> {
        let invite = self.find_by_code(code).await?;
        ensure_redeemable(&invite, Utc::now())?;

        let school = self
            .store
            .find_school(invite.school_id)
            .await
            .map_err(StoreError::into_app_error)?
            .ok_or_else(|| AppError::internal_error("Invite references a missing school"))?;

        Ok(InviteDetails {
            email: invite.email,
            first_name: invite.first_name,
            last_name: invite.last_name,
            school_name: school.name,
            subject: invite.subject,
            expires_at: invite.expires_at,
        })
    }

    #[instrument(skip(self, dto))]
    pub async fn redeem_invite(
        &self,
        dto: RedeemInviteRequest,
    ) -> Result<RedeemInviteResponse, AppError> {
        let invite = self.find_by_code(&dto.code).await?;
        ensure_redeemable(&invite, Utc::now())?;

        if dto.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::bad_request(anyhow!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        if self
            .store
            .find_user_by_email(&invite.email)
            .await
            .map_err(StoreError::into_app_error)?
            .is_some()
        {
            return Err(AppError::conflict(anyhow!(
                "An account with this email already exists"
            )));
        }

        let password_hash = hash_password_async(dto.password).await?;

        // The store re-checks every precondition atomically with the write.
        let account = self
            .store
            .redeem_invite(&invite.code, password_hash, Utc::now())
            .await
            .map_err(StoreError::into_app_error)?;

        track_invite_redeemed();
        info!(invite.id = %invite.id, user.id = %account.id, "Invite redeemed");

        Ok(RedeemInviteResponse {
            new_account_id: account.id,
        })
    }
}
