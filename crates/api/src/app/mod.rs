//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store wiring (SQLite pool or in-memory)
//! - `patterns.rs`: message patterns and their dispatch
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request payloads and their mapping to domain input
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod patterns;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
