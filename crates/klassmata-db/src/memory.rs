//! In-process [`InviteStore`] with the same semantics as the Postgres store.
//!
//! All state sits behind one async mutex, and every operation, redemption
//! included, runs entirely while holding it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use klassmata_models::{
    Email, InviteId, InviteRecord, InviteStatus, NewUser, Role, School, SchoolId, UserAccount,
    UserCredentials, UserId,
};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::{InviteStore, NewInvite};

#[derive(Debug, Clone)]
struct StoredUser {
    account: UserAccount,
    password_hash: String,
}

#[derive(Debug, Default)]
struct State {
    schools: HashMap<SchoolId, School>,
    users: HashMap<UserId, StoredUser>,
    invites: HashMap<InviteId, InviteRecord>,
}

impl State {
    fn user_by_email(&self, email: &Email) -> Option<&StoredUser> {
        self.users
            .values()
            .find(|u| u.account.email.as_str().eq_ignore_ascii_case(email.as_str()))
    }

    fn invite_by_code(&self, code: &str) -> Option<&InviteRecord> {
        self.invites.values().find(|i| i.code == code)
    }

    fn insert_user(&mut self, user: NewUser) -> Result<UserAccount, StoreError> {
        if self.user_by_email(&user.email).is_some() {
            return Err(StoreError::email_taken());
        }

        let account = UserAccount {
            id: UserId::new(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            school_id: user.school_id,
            created_at: Utc::now(),
        };
        self.users.insert(
            account.id,
            StoredUser {
                account: account.clone(),
                password_hash: user.password_hash,
            },
        );

        Ok(account)
    }
}

#[derive(Debug, Default)]
pub struct MemoryInviteStore {
    state: Mutex<State>,
}

impl MemoryInviteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InviteStore for MemoryInviteStore {
    async fn create_school(&self, name: &str) -> Result<School, StoreError> {
        let school = School {
            id: SchoolId::new(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .await
            .schools
            .insert(school.id, school.clone());
        Ok(school)
    }

    async fn find_school(&self, id: SchoolId) -> Result<Option<School>, StoreError> {
        Ok(self.state.lock().await.schools.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<UserAccount, StoreError> {
        self.state.lock().await.insert_user(user)
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<UserAccount>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.user_by_email(email).map(|u| u.account.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.user_by_email(email).map(|u| UserCredentials {
            id: u.account.id,
            email: u.account.email.clone(),
            role: u.account.role,
            school_id: u.account.school_id,
            password_hash: u.password_hash.clone(),
        }))
    }

    async fn create_invite(&self, invite: NewInvite) -> Result<InviteRecord, StoreError> {
        let mut state = self.state.lock().await;

        if state.invite_by_code(&invite.code).is_some() {
            return Err(StoreError::CodeTaken);
        }
        let pending_exists = state.invites.values().any(|i| {
            i.school_id == invite.school_id
                && i.status == InviteStatus::Pending
                && i.email.as_str().eq_ignore_ascii_case(invite.email.as_str())
        });
        if pending_exists {
            return Err(StoreError::conflict(
                "A pending invite already exists for this email",
            ));
        }

        let record = InviteRecord {
            id: InviteId::new(),
            code: invite.code,
            email: invite.email,
            first_name: invite.first_name,
            last_name: invite.last_name,
            subject: invite.subject,
            school_id: invite.school_id,
            invited_by: invite.invited_by,
            status: InviteStatus::Pending,
            created_at: invite.created_at,
            expires_at: invite.expires_at,
            used_at: None,
            used_by_user_id: None,
        };
        state.invites.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_invite(&self, id: InviteId) -> Result<Option<InviteRecord>, StoreError> {
        Ok(self.state.lock().await.invites.get(&id).cloned())
    }

    async fn find_invite_by_code(&self, code: &str) -> Result<Option<InviteRecord>, StoreError> {
        Ok(self.state.lock().await.invite_by_code(code).cloned())
    }

    async fn find_pending_invite(
        &self,
        school_id: SchoolId,
        email: &Email,
    ) -> Result<Option<InviteRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .invites
            .values()
            .find(|i| {
                i.school_id == school_id
                    && i.status == InviteStatus::Pending
                    && i.email.as_str().eq_ignore_ascii_case(email.as_str())
            })
            .cloned())
    }

    async fn list_invites(&self, school_id: SchoolId) -> Result<Vec<InviteRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut invites: Vec<InviteRecord> = state
            .invites
            .values()
            .filter(|i| i.school_id == school_id)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(invites)
    }

    async fn cancel_invite(&self, id: InviteId) -> Result<InviteRecord, StoreError> {
        let mut state = self.state.lock().await;
        let invite = state
            .invites
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Invite"))?;

        match invite.status {
            InviteStatus::Pending => {
                invite.status = InviteStatus::Cancelled;
                Ok(invite.clone())
            }
            InviteStatus::Cancelled => Ok(invite.clone()),
            InviteStatus::Accepted => Err(StoreError::conflict(
                "Accepted invites cannot be cancelled",
            )),
        }
    }

    async fn redeem_invite(
        &self,
        code: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<UserAccount, StoreError> {
        let mut state = self.state.lock().await;

        let invite = state
            .invite_by_code(code)
            .cloned()
            .ok_or(StoreError::NotFound("Invite"))?;

        if invite.status != InviteStatus::Pending {
            return Err(StoreError::already_used());
        }
        if invite.is_expired(now) {
            return Err(StoreError::Expired);
        }

        let account = state.insert_user(NewUser {
            email: invite.email.clone(),
            first_name: invite.first_name.clone(),
            last_name: invite.last_name.clone(),
            role: Role::Teacher,
            school_id: Some(invite.school_id),
            password_hash,
        })?;

        if let Some(stored) = state.invites.get_mut(&invite.id) {
            stored.status = InviteStatus::Accepted;
            stored.used_at = Some(now);
            stored.used_by_user_id = Some(account.id);
        }

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    async fn seeded() -> (MemoryInviteStore, SchoolId) {
        let store = MemoryInviteStore::new();
        let school = store.create_school("Springfield High").await.unwrap();
        (store, school.id)
    }

    fn new_invite(school_id: SchoolId, code: &str, email: &str) -> NewInvite {
        let now = Utc::now();
        NewInvite {
            code: code.to_string(),
            email: Email::new(email).unwrap(),
            first_name: "Edna".to_string(),
            last_name: "Krabappel".to_string(),
            subject: Some("English".to_string()),
            school_id,
            invited_by: None,
            created_at: now,
            expires_at: now + Duration::days(7),
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: Email::new(email).unwrap(),
            first_name: "Seymour".to_string(),
            last_name: "Skinner".to_string(),
            role: Role::Admin,
            school_id: None,
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_email_is_unique_case_insensitively() {
        let (store, _) = seeded().await;
        store.create_user(new_user("skinner@school.com")).await.unwrap();

        let err = store
            .create_user(new_user("SKINNER@school.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = store
            .find_user_by_email(&Email::new("Skinner@School.com").unwrap())
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_one_pending_invite_per_school_and_email() {
        let (store, school_id) = seeded().await;
        store
            .create_invite(new_invite(school_id, "AAAAA11111", "edna@school.com"))
            .await
            .unwrap();

        let err = store
            .create_invite(new_invite(school_id, "BBBBB22222", "Edna@School.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let other_school = store.create_school("Shelbyville").await.unwrap();
        store
            .create_invite(new_invite(other_school.id, "CCCCC33333", "edna@school.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_code_is_reported() {
        let (store, school_id) = seeded().await;
        store
            .create_invite(new_invite(school_id, "AAAAA11111", "a@school.com"))
            .await
            .unwrap();
        let err = store
            .create_invite(new_invite(school_id, "AAAAA11111", "b@school.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CodeTaken));
    }

    #[tokio::test]
    async fn test_cancel_transitions() {
        let (store, school_id) = seeded().await;
        let invite = store
            .create_invite(new_invite(school_id, "AAAAA11111", "edna@school.com"))
            .await
            .unwrap();

        let cancelled = store.cancel_invite(invite.id).await.unwrap();
        assert_eq!(cancelled.status, InviteStatus::Cancelled);

        let again = store.cancel_invite(invite.id).await.unwrap();
        assert_eq!(again.status, InviteStatus::Cancelled);

        let err = store.cancel_invite(InviteId::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cancelled_invite_cannot_be_redeemed() {
        let (store, school_id) = seeded().await;
        let invite = store
            .create_invite(new_invite(school_id, "AAAAA11111", "edna@school.com"))
            .await
            .unwrap();
        store.cancel_invite(invite.id).await.unwrap();

        let err = store
            .redeem_invite("AAAAA11111", "hash".to_string(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_redeem_marks_invite_accepted() {
        let (store, school_id) = seeded().await;
        let invite = store
            .create_invite(new_invite(school_id, "AAAAA11111", "edna@school.com"))
            .await
            .unwrap();

        let now = Utc::now();
        let account = store
            .redeem_invite("AAAAA11111", "hash".to_string(), now)
            .await
            .unwrap();
        assert_eq!(account.role, Role::Teacher);
        assert_eq!(account.school_id, Some(school_id));
        assert_eq!(account.email.as_str(), "edna@school.com");

        let stored = store.find_invite(invite.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Accepted);
        assert_eq!(stored.used_at, Some(now));
        assert_eq!(stored.used_by_user_id, Some(account.id));

        let err = store.cancel_invite(invite.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_redeem_expired_invite() {
        let (store, school_id) = seeded().await;
        store
            .create_invite(new_invite(school_id, "AAAAA11111", "edna@school.com"))
            .await
            .unwrap();

        let later = Utc::now() + Duration::days(8);
        let err = store
            .redeem_invite("AAAAA11111", "hash".to_string(), later)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Expired));
    }

    #[tokio::test]
    async fn test_redeem_when_email_registered_meanwhile() {
        let (store, school_id) = seeded().await;
        store
            .create_invite(new_invite(school_id, "AAAAA11111", "edna@school.com"))
            .await
            .unwrap();
        store.create_user(new_user("edna@school.com")).await.unwrap();

        let err = store
            .redeem_invite("AAAAA11111", "hash".to_string(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let invite = store.find_invite_by_code("AAAAA11111").await.unwrap().unwrap();
        assert_eq!(invite.status, InviteStatus::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_have_one_winner() {
        let (store, school_id) = seeded().await;
        store
            .create_invite(new_invite(school_id, "AAAAA11111", "edna@school.com"))
            .await
            .unwrap();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .redeem_invite("AAAAA11111", "hash".to_string(), Utc::now())
                        .await
                })
            })
            .collect();

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(StoreError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 15);
    }

    #[tokio::test]
    async fn test_list_invites_newest_first() {
        let (store, school_id) = seeded().await;
        let mut older = new_invite(school_id, "AAAAA11111", "old@school.com");
        older.created_at -= Duration::days(2);
        store.create_invite(older).await.unwrap();
        store
            .create_invite(new_invite(school_id, "BBBBB22222", "new@school.com"))
            .await
            .unwrap();

        let invites = store.list_invites(school_id).await.unwrap();
        let emails: Vec<&str> = invites.iter().map(|i| i.email.as_str()).collect();
        assert_eq!(emails, vec!["new@school.com", "old@school.com"]);

        assert!(store.list_invites(SchoolId::new()).await.unwrap().is_empty());
    }
}
