use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use super::{ApiError, AppState};
use crate::coordinator::HealthStatus;
use crate::formatter::JsonFormatter;
use crate::formatter::json::DeviceStateJson;

#[derive(Debug, Serialize)]
pub struct DeviceSummary {
    pub name: String,
    pub status: HealthStatus,
    pub consecutive_failures: u32,
    pub poll_interval_secs: u64,
}

pub async fn list_devices(State(state): State<AppState>) -> Json<Vec<DeviceSummary>> {
    Json(
        state
            .devices
            .iter()
            .map(|(name, device)| {
                let current = device.coordinator.current_state();
                DeviceSummary {
                    name: name.clone(),
                    status: current.status(),
                    consecutive_failures: current.consecutive_failures,
                    poll_interval_secs: device.coordinator.poll_interval().as_secs(),
                }
            })
            .collect(),
    )
}

pub async fn device_state(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeviceStateJson>, ApiError> {
    let device = state.devices.get(&name).ok_or_else(|| ApiError::NotFound(name.clone()))?;
    Ok(Json(JsonFormatter::format_state(
        &name,
        &device.coordinator.current_state(),
        &device.entities,
    )))
}
