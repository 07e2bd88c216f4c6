use axum::extract::State;
use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

use super::AppState;
use crate::coordinator::HealthStatus;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let healthy = state
        .devices
        .values()
        .filter(|d| d.coordinator.current_state().status() == HealthStatus::Healthy)
        .count();

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "UTC_time": chrono::Utc::now().to_rfc2822(),
            "devices": state.devices.len(),
            "healthy": healthy,
        })),
    )
}
