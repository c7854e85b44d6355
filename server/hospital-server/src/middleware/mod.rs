//! Middleware modules for request processing

pub mod auth_context;

pub use auth_context::AuthContext;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Permissive CORS layer for the API
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Log method, path, status and latency for every request
pub async fn request_timing_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}
