//! Role-based access gate.
//!
//! Every request that is not on the public allow-list is checked against
//! [`ACCESS_RULES`] before it reaches a handler. Page requests are answered
//! with redirects, `/api` requests with JSON errors.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use klassmata_core::AppError;
use klassmata_models::Role;
use klassmata_observability::track_access_decision;
use tracing::{debug, info};

use crate::middleware::auth::{AuthUser, decode_session};
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Paths that bypass the gate entirely.
pub const PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/register",
    "/invite",
    "/unauthorized",
    "/api/auth",
    "/api/invites",
    "/health",
    "/metrics",
    "/swagger-ui",
    "/api-docs",
    "/scalar",
    "/static",
    "/_next",
    "/favicon.ico",
];

/// Generic entry points that forward to the caller's own dashboard.
const DASHBOARD_ENTRY_PATHS: &[&str] = &["/", "/dashboard"];

/// Roles allowed under a set of path prefixes.
#[derive(Debug)]
pub struct AccessRule {
    pub prefixes: &'static [&'static str],
    pub allowed: &'static [Role],
}

pub const ACCESS_RULES: &[AccessRule] = &[
    AccessRule {
        prefixes: &["/admin", "/api/admin"],
        allowed: &[Role::Admin, Role::SuperAdmin],
    },
    AccessRule {
        prefixes: &["/super", "/api/super"],
        allowed: &[Role::SuperAdmin],
    },
    AccessRule {
        prefixes: &["/teacher"],
        allowed: &[Role::Teacher, Role::Admin, Role::SuperAdmin],
    },
    AccessRule {
        prefixes: &["/student"],
        allowed: &[Role::Student, Role::Teacher, Role::Admin, Role::SuperAdmin],
    },
    AccessRule {
        prefixes: &["/parent"],
        allowed: &[Role::Parent, Role::Admin, Role::SuperAdmin],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectToLogin,
    RedirectToDashboard(&'static str),
    RedirectToUnauthorized,
    ForbiddenJson,
    UnauthenticatedJson,
}

impl AccessDecision {
    pub fn as_label(&self) -> &'static str {
        match self {
            AccessDecision::Allow => "allow",
            AccessDecision::RedirectToLogin => "redirect_login",
            AccessDecision::RedirectToDashboard(_) => "redirect_dashboard",
            AccessDecision::RedirectToUnauthorized => "redirect_unauthorized",
            AccessDecision::ForbiddenJson => "forbidden_json",
            AccessDecision::UnauthenticatedJson => "unauthenticated_json",
        }
    }
}

pub fn dashboard_for(role: Role) -> &'static str {
    match role {
        Role::SuperAdmin => "/super/dashboard",
        Role::Admin => "/admin/dashboard",
        Role::Teacher => "/teacher/dashboard",
        Role::Student => "/student/dashboard",
        Role::Parent => "/parent/dashboard",
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Segment-aware prefix match: `/admin` matches `/admin` and `/admin/x`,
/// never `/administrator`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn is_public_path(path: &str) -> bool {
    let path = normalize(path);
    PUBLIC_PATHS.iter().any(|p| matches_prefix(path, p))
}

fn is_api_path(path: &str) -> bool {
    matches_prefix(path, "/api")
}

/// Decides what happens to a request for `path` made with `session`.
pub fn authorize(session: Option<&AuthUser>, path: &str) -> AccessDecision {
    let path = normalize(path);

    if is_public_path(path) {
        return AccessDecision::Allow;
    }

    let api = is_api_path(path);

    let Some(session) = session else {
        return if api {
            AccessDecision::UnauthenticatedJson
        } else {
            AccessDecision::RedirectToLogin
        };
    };

    let role = session.role();

    if DASHBOARD_ENTRY_PATHS.contains(&path) {
        return match role {
            Some(role) => AccessDecision::RedirectToDashboard(dashboard_for(role)),
            None => AccessDecision::RedirectToUnauthorized,
        };
    }

    let permitted = ACCESS_RULES
        .iter()
        .filter(|rule| rule.prefixes.iter().any(|p| matches_prefix(path, p)))
        .all(|rule| role.is_some_and(|r| rule.allowed.contains(&r)));

    match (permitted, api) {
        (true, _) => AccessDecision::Allow,
        (false, true) => AccessDecision::ForbiddenJson,
        (false, false) => AccessDecision::RedirectToUnauthorized,
    }
}

fn rejection(decision: AccessDecision) -> Response {
    match decision {
        AccessDecision::RedirectToLogin => Redirect::temporary(LOGIN_PATH).into_response(),
        AccessDecision::RedirectToDashboard(target) => Redirect::temporary(target).into_response(),
        AccessDecision::RedirectToUnauthorized => {
            Redirect::temporary(UNAUTHORIZED_PATH).into_response()
        }
        AccessDecision::ForbiddenJson => {
            AppError::forbidden("You do not have access to this resource").into_response()
        }
        AccessDecision::UnauthenticatedJson | AccessDecision::Allow => {
            AppError::unauthorized("Authentication required").into_response()
        }
    }
}

/// Middleware applying [`authorize`] to every request.
///
/// On allow, the decoded session is attached to the request extensions for
/// the [`AuthUser`] extractor.
pub async fn access_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    if is_public_path(&path) {
        return next.run(req).await;
    }

    let session = decode_session(req.headers(), &state.jwt_config);
    let decision = authorize(session.as_ref(), &path);
    track_access_decision(decision.as_label());

    if decision == AccessDecision::Allow {
        debug!(path = %path, "Access allowed");
        if let Some(user) = session {
            req.extensions_mut().insert(user);
        }
        return next.run(req).await;
    }

    info!(
        path = %path,
        role = session.as_ref().map(|s| s.0.role.as_str()).unwrap_or("anonymous"),
        outcome = decision.as_label(),
        "Access denied"
    );
    rejection(decision)
}
