//! Store tests against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` set and `--features postgres-tests`.
#![cfg(feature = "postgres-tests")]

use std::sync::Arc;

use chrono::{Duration, Utc};
use klassmata::klassmata_db::{InviteStore, NewInvite, PgInviteStore, StoreError};
use klassmata::klassmata_models::{Email, InviteStatus, NewUser, Role, SchoolId};
use sqlx::PgPool;

fn new_invite(school_id: SchoolId, email: &str, code: &str) -> NewInvite {
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

#[sqlx::test(migrations = "./migrations")]
async fn test_create_and_find_invite(pool: PgPool) {
    let store = PgInviteStore::new(pool);
    let school = store.create_school("Springfield High").await.unwrap();

    let invite = store
        .create_invite(new_invite(school.id, "Edna@Springfield.edu", "CODE000001"))
        .await
        .unwrap();

    assert_eq!(invite.status, InviteStatus::Pending);
    assert_eq!(invite.email.as_str(), "edna@springfield.edu");

    let by_code = store.find_invite_by_code("CODE000001").await.unwrap().unwrap();
    assert_eq!(by_code.id, invite.id);

    let pending = store
        .find_pending_invite(school.id, &Email::new("EDNA@springfield.edu").unwrap())
        .await
        .unwrap();
    assert_eq!(pending.map(|i| i.id), Some(invite.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_one_pending_invite_per_email(pool: PgPool) {
    let store = PgInviteStore::new(pool);
    let school = store.create_school("Springfield High").await.unwrap();
    store
        .create_invite(new_invite(school.id, "edna@springfield.edu", "CODE000001"))
        .await
        .unwrap();

    let duplicate = store
        .create_invite(new_invite(school.id, "EDNA@springfield.edu", "CODE000002"))
        .await;
    assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

    let code_clash = store
        .create_invite(new_invite(school.id, "other@springfield.edu", "CODE000001"))
        .await;
    assert!(matches!(code_clash, Err(StoreError::CodeTaken)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_redeem_creates_teacher_once(pool: PgPool) {
    let store = PgInviteStore::new(pool);
    let school = store.create_school("Springfield High").await.unwrap();
    store
        .create_invite(new_invite(school.id, "edna@springfield.edu", "CODE000001"))
        .await
        .unwrap();

    let account = store
        .redeem_invite("CODE000001", "hash".to_string(), Utc::now())
        .await
        .unwrap();
    assert_eq!(account.role, Role::Teacher);
    assert_eq!(account.school_id, Some(school.id));

    let invite = store.find_invite_by_code("CODE000001").await.unwrap().unwrap();
    assert_eq!(invite.status, InviteStatus::Accepted);
    assert_eq!(invite.used_by_user_id, Some(account.id));
    assert!(invite.used_at.is_some());

    let again = store
        .redeem_invite("CODE000001", "hash".to_string(), Utc::now())
        .await;
    assert!(matches!(again, Err(StoreError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_redeem_expired_invite(pool: PgPool) {
    let store = PgInviteStore::new(pool);
    let school = store.create_school("Springfield High").await.unwrap();
    store
        .create_invite(new_invite(school.id, "edna@springfield.edu", "CODE000001"))
        .await
        .unwrap();

    let later = Utc::now() + Duration::days(8);
    let result = store
        .redeem_invite("CODE000001", "hash".to_string(), later)
        .await;

    assert!(matches!(result, Err(StoreError::Expired)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_redeem_when_email_registered(pool: PgPool) {
    let store = PgInviteStore::new(pool);
    let school = store.create_school("Springfield High").await.unwrap();
    store
        .create_invite(new_invite(school.id, "edna@springfield.edu", "CODE000001"))
        .await
        .unwrap();
    store
        .create_user(NewUser {
            email: Email::new("EDNA@springfield.edu").unwrap(),
            first_name: "Edna".to_string(),
            last_name: "K".to_string(),
            role: Role::Teacher,
            school_id: Some(school.id),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();

    let result = store
        .redeem_invite("CODE000001", "hash".to_string(), Utc::now())
        .await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));

    let invite = store.find_invite_by_code("CODE000001").await.unwrap().unwrap();
    assert_eq!(invite.status, InviteStatus::Pending);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_redeem(pool: PgPool) {
    let store = Arc::new(PgInviteStore::new(pool));
    let school = store.create_school("Springfield High").await.unwrap();
    store
        .create_invite(new_invite(school.id, "edna@springfield.edu", "CODE000001"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .redeem_invite("CODE000001", "hash".to_string(), Utc::now())
                .await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(StoreError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(wins, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_transitions(pool: PgPool) {
    let store = PgInviteStore::new(pool);
    let school = store.create_school("Springfield High").await.unwrap();
    let pending = store
        .create_invite(new_invite(school.id, "a@springfield.edu", "CODE000001"))
        .await
        .unwrap();
    store
        .create_invite(new_invite(school.id, "b@springfield.edu", "CODE000002"))
        .await
        .unwrap();

    let cancelled = store.cancel_invite(pending.id).await.unwrap();
    assert_eq!(cancelled.status, InviteStatus::Cancelled);
    let again = store.cancel_invite(pending.id).await.unwrap();
    assert_eq!(again.status, InviteStatus::Cancelled);

    let accepted = store
        .redeem_invite("CODE000002", "hash".to_string(), Utc::now())
        .await
        .unwrap();
    let accepted_invite = store.find_invite_by_code("CODE000002").await.unwrap().unwrap();
    assert_eq!(accepted_invite.used_by_user_id, Some(accepted.id));
    assert!(matches!(
        store.cancel_invite(accepted_invite.id).await,
        Err(StoreError::Conflict(_))
    ));

    let listed = store.list_invites(school.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].created_at >= listed[1].created_at);
}
