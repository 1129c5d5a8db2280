use anyhow::anyhow;
use axum::http::{HeaderValue, Method, Uri};
use axum::routing::get;
use axum::{Router, middleware};
use klassmata_core::AppError;
use klassmata_observability::{PrometheusHandle, logging_middleware, metrics_middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::middleware::access::access_gate;
use crate::modules::auth::router::init_auth_router;
use crate::modules::health::health_check;
use crate::modules::invites::router::{init_admin_invites_router, init_public_invites_router};
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::not_found(anyhow!("No route for {}", uri.path()))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}

/// Builds the application router.
///
/// The access gate wraps every route including the fallback, so page paths
/// without a handler here are still redirected by role.
pub fn init_router(state: AppState, metrics: Option<PrometheusHandle>) -> Router {
    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .nest("/invites", init_public_invites_router())
                .nest("/admin/invites", init_admin_invites_router()),
        )
        .route_layer(middleware::from_fn(metrics_middleware));

    if let Some(handle) = metrics {
        router = router.route("/metrics", get(move || std::future::ready(handle.render())));
    }

    router
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}
