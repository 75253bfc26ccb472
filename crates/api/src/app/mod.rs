//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/repository wiring and the authorization components
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, routing::post, Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// API tests).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    build_app_with_services(config, services)
}

/// Router over pre-built services (tests wire in-memory services directly).
pub fn build_app_with_services(
    config: &AppConfig,
    services: Arc<services::AppServices>,
) -> anyhow::Result<Router> {
    let auth_state = middleware::AuthState {
        authenticator: services.authenticator.clone(),
    };

    // Protected routes: require a valid bearer token.
    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    let mut origins = Vec::with_capacity(config.cors_allowed_origins.len());
    for origin in &config.cors_allowed_origins {
        let value: HeaderValue = origin
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid CORS origin {origin:?}: {e}"))?;
        origins.push(value);
    }
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(tower_http::cors::Any)
        .allow_origin(AllowOrigin::list(origins));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/token", post(routes::auth::login))
        .layer(Extension(services))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(cors)))
}
