//! Health check endpoint.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/health — liveness check.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "LocalStore API is running",
        timestamp: Utc::now(),
    })
}
