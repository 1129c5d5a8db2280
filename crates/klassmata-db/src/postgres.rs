//! PostgreSQL-backed [`InviteStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use klassmata_models::{
    Email, InviteId, InviteRecord, InviteStatus, NewUser, Role, School, SchoolId, UserAccount,
    UserCredentials, UserId,
};
use sqlx::PgPool;
use tracing::instrument;

use crate::error::StoreError;
use crate::store::{InviteStore, NewInvite};

const INVITE_COLUMNS: &str = "id, code, email, first_name, last_name, subject, school_id, \
     invited_by, status, created_at, expires_at, used_at, used_by_user_id";

const USER_COLUMNS: &str = "id, email, first_name, last_name, role, school_id, created_at";

const CODE_CONSTRAINT: &str = "teacher_invites_code_key";
const PENDING_CONSTRAINT: &str = "teacher_invites_one_pending_key";

#[derive(Clone)]
pub struct PgInviteStore {
    pool: PgPool,
}

impl PgInviteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn unique_violation(e: &sqlx::Error) -> Option<Option<&str>> {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Some(db_err.constraint()),
        _ => None,
    }
}

fn map_user_insert_error(e: sqlx::Error) -> StoreError {
    if unique_violation(&e).is_some() {
        return StoreError::email_taken();
    }
    StoreError::Database(e)
}

#[async_trait]
impl InviteStore for PgInviteStore {
    #[instrument(skip(self))]
    async fn create_school(&self, name: &str) -> Result<School, StoreError> {
        let school = sqlx::query_as::<_, School>(
            "INSERT INTO schools (id, name) VALUES ($1, $2) RETURNING id, name, created_at",
        )
        .bind(SchoolId::new())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(school)
    }

    #[instrument(skip(self))]
    async fn find_school(&self, id: SchoolId) -> Result<Option<School>, StoreError> {
        let school =
            sqlx::query_as::<_, School>("SELECT id, name, created_at FROM schools WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(school)
    }

    #[instrument(skip(self, user), fields(user.email = %user.email, user.role = %user.role))]
    async fn create_user(&self, user: NewUser) -> Result<UserAccount, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, first_name, last_name, role, school_id, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, UserAccount>(&sql)
            .bind(UserId::new())
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.role)
            .bind(user.school_id)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_insert_error)
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<UserAccount>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");

        let user = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, role, school_id, password_hash FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credentials)
    }

    #[instrument(skip(self, invite), fields(school.id = %invite.school_id))]
    async fn create_invite(&self, invite: NewInvite) -> Result<InviteRecord, StoreError> {
        let sql = format!(
            "INSERT INTO teacher_invites \
                (id, code, email, first_name, last_name, subject, school_id, invited_by, status, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9, $10) \
             RETURNING {INVITE_COLUMNS}"
        );

        sqlx::query_as::<_, InviteRecord>(&sql)
            .bind(InviteId::new())
            .bind(&invite.code)
            .bind(&invite.email)
            .bind(&invite.first_name)
            .bind(&invite.last_name)
            .bind(&invite.subject)
            .bind(invite.school_id)
            .bind(invite.invited_by)
            .bind(invite.created_at)
            .bind(invite.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(Some(CODE_CONSTRAINT)) => StoreError::CodeTaken,
                Some(Some(PENDING_CONSTRAINT)) => {
                    StoreError::conflict("A pending invite already exists for this email")
                }
                _ => StoreError::Database(e),
            })
    }

    #[instrument(skip(self))]
    async fn find_invite(&self, id: InviteId) -> Result<Option<InviteRecord>, StoreError> {
        let sql = format!("SELECT {INVITE_COLUMNS} FROM teacher_invites WHERE id = $1");

        let invite = sqlx::query_as::<_, InviteRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invite)
    }

    #[instrument(skip(self, code))]
    async fn find_invite_by_code(&self, code: &str) -> Result<Option<InviteRecord>, StoreError> {
        let sql = format!("SELECT {INVITE_COLUMNS} FROM teacher_invites WHERE code = $1");

        let invite = sqlx::query_as::<_, InviteRecord>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invite)
    }

    #[instrument(skip(self))]
    async fn find_pending_invite(
        &self,
        school_id: SchoolId,
        email: &Email,
    ) -> Result<Option<InviteRecord>, StoreError> {
        let sql = format!(
            "SELECT {INVITE_COLUMNS} FROM teacher_invites \
             WHERE school_id = $1 AND LOWER(email) = LOWER($2) AND status = 'pending'"
        );

        let invite = sqlx::query_as::<_, InviteRecord>(&sql)
            .bind(school_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invite)
    }

    #[instrument(skip(self))]
    async fn list_invites(&self, school_id: SchoolId) -> Result<Vec<InviteRecord>, StoreError> {
        let sql = format!(
            "SELECT {INVITE_COLUMNS} FROM teacher_invites \
             WHERE school_id = $1 ORDER BY created_at DESC, id"
        );

        let invites = sqlx::query_as::<_, InviteRecord>(&sql)
            .bind(school_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(invites)
    }

    #[instrument(skip(self))]
    async fn cancel_invite(&self, id: InviteId) -> Result<InviteRecord, StoreError> {
        let sql = format!(
            "UPDATE teacher_invites SET status = 'cancelled' \
             WHERE id = $1 AND status = 'pending' RETURNING {INVITE_COLUMNS}"
        );

        let cancelled = sqlx::query_as::<_, InviteRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(invite) = cancelled {
            return Ok(invite);
        }

        // Nothing pending was updated; report why from the current row.
        match self.find_invite(id).await? {
            None => Err(StoreError::NotFound("Invite")),
            Some(invite) if invite.status == InviteStatus::Cancelled => Ok(invite),
            Some(_) => Err(StoreError::conflict("Accepted invites cannot be cancelled")),
        }
    }

    #[instrument(skip(self, code, password_hash))]
    async fn redeem_invite(
        &self,
        code: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<UserAccount, StoreError> {
        let mut tx = self.pool.begin().await?;

        let lock_sql =
            format!("SELECT {INVITE_COLUMNS} FROM teacher_invites WHERE code = $1 FOR UPDATE");
        let invite = sqlx::query_as::<_, InviteRecord>(&lock_sql)
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound("Invite"))?;

        if invite.status != InviteStatus::Pending {
            return Err(StoreError::already_used());
        }
        if invite.is_expired(now) {
            return Err(StoreError::Expired);
        }

        let taken: Option<(UserId,)> =
            sqlx::query_as("SELECT id FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(&invite.email)
                .fetch_optional(&mut *tx)
                .await?;
        if taken.is_some() {
            return Err(StoreError::email_taken());
        }

        let user_sql = format!(
            "INSERT INTO users (id, email, first_name, last_name, role, school_id, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, UserAccount>(&user_sql)
            .bind(UserId::new())
            .bind(&invite.email)
            .bind(&invite.first_name)
            .bind(&invite.last_name)
            .bind(Role::Teacher)
            .bind(invite.school_id)
            .bind(&password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_user_insert_error)?;

        let updated = sqlx::query(
            "UPDATE teacher_invites SET status = 'accepted', used_at = $2, used_by_user_id = $3 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(invite.id)
        .bind(now)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::already_used());
        }

        tx.commit().await?;

        Ok(user)
    }
}
