//! HTTP API application wiring (Axum router + service wiring).
//!
//! This folder is structured like:
//! - `services.rs`: the per-backend service bundle handed to handlers
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use bazaar_infra::{InMemoryStore, MarketStore};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the HTTP router on top of any storage backend.
///
/// Domain routes require an authenticated identity; `/health` does not.
pub fn app_with_store<S: MarketStore + Clone + 'static>(store: S) -> Router {
    let services = Arc::new(services::Services::new(store));

    let protected = routes::router::<S>()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::identity_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}

/// Build the full HTTP router on the in-memory store (tests/dev; the public
/// entrypoint used by `main.rs` when no database is configured).
pub fn build_app() -> Router {
    app_with_store(InMemoryStore::new())
}
