#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use klassmata::klassmata_auth::create_access_token;
use klassmata::klassmata_config::{CorsConfig, EmailConfig, InviteConfig, JwtConfig};
use klassmata::klassmata_core::hash_password;
use klassmata::klassmata_db::{InviteStore, MemoryInviteStore};
use klassmata::klassmata_models::{Email, NewUser, Role, School, SchoolId, UserAccount, UserId};
use klassmata::router::init_router;
use klassmata::state::AppState;
use klassmata::utils::email::{MailError, Mailer};
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "adminpass123";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailMode {
    Deliver,
    Fail,
    Hang,
}

/// Mailer double that records what it was asked to send.
pub struct RecordingMailer {
    mode: MailMode,
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingMailer {
    pub fn new(mode: MailMode) -> Self {
        Self {
            mode,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        _html_body: &str,
        text_body: &str,
    ) -> Result<(), MailError> {
        match self.mode {
            MailMode::Deliver => {
                self.sent.lock().unwrap().push(SentEmail {
                    to: to.to_string(),
                    subject: subject.to_string(),
                    text_body: text_body.to_string(),
                });
                Ok(())
            }
            MailMode::Fail => Err(MailError::Transport("connection refused".to_string())),
            MailMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryInviteStore>,
    pub mailer: Arc<RecordingMailer>,
    pub jwt_config: JwtConfig,
    pub school: School,
    pub admin: UserAccount,
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 3600,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_mail(MailMode::Deliver).await
}

/// App over an in-memory store seeded with one school and its admin.
pub async fn spawn_app_with_mail(mode: MailMode) -> TestApp {
    let store = Arc::new(MemoryInviteStore::new());
    let mailer = Arc::new(RecordingMailer::new(mode));
    let jwt_config = jwt_config();

    let school = store.create_school("Springfield High").await.unwrap();
    let admin = store
        .create_user(NewUser {
            email: Email::new("principal@springfield.edu").unwrap(),
            first_name: "Seymour".to_string(),
            last_name: "Skinner".to_string(),
            role: Role::Admin,
            school_id: Some(school.id),
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
        })
        .await
        .unwrap();

    let email_config = EmailConfig {
        enabled: false,
        smtp_host: "localhost".to_string(),
        smtp_port: 1025,
        smtp_username: String::new(),
        smtp_password: String::new(),
        from_email: "noreply@klassmata.com".to_string(),
        from_name: "KlassMata".to_string(),
        frontend_url: "http://localhost:3000".to_string(),
    };
    let invite_config = InviteConfig {
        ttl_days: 7,
        email_timeout: Duration::from_millis(200),
    };
    let cors_config = CorsConfig {
        allowed_origins: vec!["http://localhost:3000".to_string()],
    };

    let state = AppState::new(
        store.clone(),
        mailer.clone(),
        jwt_config.clone(),
        &email_config,
        invite_config,
        cors_config,
    );

    TestApp {
        router: init_router(state, None),
        store,
        mailer,
        jwt_config,
        school,
        admin,
    }
}

impl TestApp {
    pub fn admin_token(&self) -> String {
        create_access_token(
            self.admin.id,
            &self.admin.email,
            Role::Admin,
            Some(self.school.id),
            &self.jwt_config,
        )
        .unwrap()
    }

    /// Token for a user that exists only in the token.
    pub fn token_for(&self, role: Role, school_id: Option<SchoolId>) -> String {
        create_access_token(
            UserId::new(),
            &Email::new("someone@springfield.edu").unwrap(),
            role,
            school_id,
            &self.jwt_config,
        )
        .unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        send(&self.router, request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
