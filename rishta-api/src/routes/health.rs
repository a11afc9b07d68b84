use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use rishta_shared::types::api::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let checks = vec![
        HealthCheck::from_result("database", state.store.ping()),
        HealthCheck::from_result("redis", state.redis.ping().await),
    ];
    let response = HealthResponse::healthy("rishta-api", env!("CARGO_PKG_VERSION")).with_checks(checks);

    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (status, Json(response))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}
