use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::HospitalServer;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system health status
    #[schema(example = "healthy")]
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
    /// API version
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Individual service health checks
    pub checks: HashMap<String, String>,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(server): State<HospitalServer>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let mut checks = HashMap::new();

    let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&server.db_pool)
        .await
    {
        Ok(_) => "healthy",
        Err(err) => {
            tracing::warn!(error = %err, "database health check failed");
            "unhealthy"
        }
    };
    checks.insert("database".to_string(), database.to_string());

    let status = if checks.values().all(|v| v == "healthy") {
        "healthy"
    } else {
        "degraded"
    };

    Ok(Json(api_success(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    })))
}
