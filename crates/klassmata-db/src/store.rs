//! The storage abstraction the invite service is written against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use klassmata_models::{
    Email, InviteId, InviteRecord, NewUser, School, SchoolId, UserAccount, UserCredentials, UserId,
};

use crate::error::StoreError;

/// Data for a new `pending` invite.
#[derive(Debug, Clone)]
pub struct NewInvite {
    pub code: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub subject: Option<String>,
    pub school_id: SchoolId,
    pub invited_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Persistence for schools, users and invites.
///
/// Email lookups are case-insensitive. Every backend must make
/// [`InviteStore::redeem_invite`] atomic: of any number of concurrent calls
/// for one code, at most one succeeds.
#[async_trait]
pub trait InviteStore: Send + Sync {
    async fn create_school(&self, name: &str) -> Result<School, StoreError>;

    async fn find_school(&self, id: SchoolId) -> Result<Option<School>, StoreError>;

    /// Fails with [`StoreError::Conflict`] if the email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<UserAccount, StoreError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<UserAccount>, StoreError>;

    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, StoreError>;

    /// Inserts a `pending` invite.
    ///
    /// Fails with [`StoreError::Conflict`] if the school already has a pending
    /// invite for this email, or [`StoreError::CodeTaken`] if the code is in use.
    async fn create_invite(&self, invite: NewInvite) -> Result<InviteRecord, StoreError>;

    async fn find_invite(&self, id: InviteId) -> Result<Option<InviteRecord>, StoreError>;

    async fn find_invite_by_code(&self, code: &str) -> Result<Option<InviteRecord>, StoreError>;

    /// The stored-`pending` invite for `(school, email)`, expired or not.
    async fn find_pending_invite(
        &self,
        school_id: SchoolId,
        email: &Email,
    ) -> Result<Option<InviteRecord>, StoreError>;

    /// A school's invites, newest first.
    async fn list_invites(&self, school_id: SchoolId) -> Result<Vec<InviteRecord>, StoreError>;

    /// Moves a `pending` invite to `cancelled`.
    ///
    /// Cancelling an already cancelled invite returns it unchanged. Fails with
    /// [`StoreError::Conflict`] if the invite was accepted.
    async fn cancel_invite(&self, id: InviteId) -> Result<InviteRecord, StoreError>;

    /// Consumes a pending invite and creates the teacher account in one step.
    ///
    /// Re-checks, in order: the code exists, the invite is still `pending`,
    /// `now` is not past its expiry, and no account holds its email.
    async fn redeem_invite(
        &self,
        code: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<UserAccount, StoreError>;
}
