//! Hospital management HTTP API
//!
//! Patients, doctors, appointments, consultations, prescriptions,
//! medications and invoicing behind JWT bearer authentication.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod types;
pub mod utils;
pub mod validation;

pub use error::*;
pub use server::HospitalServer;

use axum::middleware::from_fn;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the application router with all routes and middleware
pub fn create_app(server: HospitalServer) -> Router {
    routes::create_routes()
        .merge(openapi::swagger_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
