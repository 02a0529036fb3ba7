//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: per-request dependencies (store, jwt, notifier)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use atrium_core::SystemType;
use atrium_store::{InMemoryStore, PgStore, Store};

use crate::config::ApiConfig;
use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Assemble the full router from already-wired services. Tests call this
/// directly with an in-memory store and a recording notifier.
pub fn router(services: Arc<services::AppServices>) -> Router {
    let auth_state = AuthState {
        jwt: services.jwt.clone(),
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::scope_router(SystemType::Saas, auth_state.clone()))
        .nest(
            "/erp",
            routes::scope_router(SystemType::Erp, auth_state.clone()),
        )
        .nest(
            "/portal",
            routes::scope_router(SystemType::Portal, auth_state),
        )
        // Outermost first: the scope stamp must observe the un-stripped URI.
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::scope_middleware))
                .layer(Extension(services)),
        )
}

/// Build the app for `main.rs`: pick the store backend from config, then
/// wire the router.
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let services = Arc::new(services::AppServices::new(store, &config.jwt_secret));
    Ok(router(services))
}
