use axum::Json;

use crate::models::{HealthResponse, Status};

/// Liveness probe. Never touches the store.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        response: Status::ok(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
