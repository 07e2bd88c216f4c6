use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::{ApiError, AppState};
use crate::config::DeviceProfile;
use crate::formatter::JsonFormatter;
use crate::formatter::json::SnapshotJson;
use crate::setup;

#[derive(Debug, Serialize)]
pub struct TestConnectionResponse {
    pub ok: bool,
    pub version: String,
    pub snapshot: SnapshotJson,
}

/// Проверяет параметры устройства одним раундом опроса
pub async fn test_connection(
    State(state): State<AppState>,
    Json(profile): Json<DeviceProfile>,
) -> Result<Json<TestConnectionResponse>, ApiError> {
    let config = profile.connection(&state.connection)?;
    let snapshot =
        setup::test_connection(&config, &state.executor, state.connection.round_timeout()).await?;

    Ok(Json(TestConnectionResponse {
        ok: true,
        version: config.version().to_string(),
        snapshot: JsonFormatter::format_snapshot(&profile.name, &snapshot),
    }))
}
