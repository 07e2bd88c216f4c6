use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub mod health;
pub mod snmp;
pub mod state;

pub use health::health;
pub use snmp::test_connection;
pub use state::{device_state, list_devices};

use crate::config::settings::ConnectionSettings;
use crate::coordinator::Coordinator;
use crate::error::{ConfigError, Failure, FailureKind};
use crate::executor::BlockingExecutor;
use crate::projection::Entity;

/// Опрашиваемое устройство в HTTP API
#[derive(Clone)]
pub struct DeviceHandle {
    pub coordinator: Coordinator,
    pub entities: Vec<Entity>,
}

/// Общее состояние обработчиков
#[derive(Clone)]
pub struct AppState {
    pub devices: Arc<BTreeMap<String, DeviceHandle>>,
    pub executor: BlockingExecutor,
    pub connection: ConnectionSettings,
}

/// Ошибка API, превращается в HTTP ответ
#[derive(Debug)]
pub enum ApiError {
    Config(ConfigError),
    Failure(Failure),
    NotFound(String),
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Config(err)
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        ApiError::Failure(failure)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

/// HTTP статус для класса ошибки опроса
pub fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::AuthenticationFailed => StatusCode::UNAUTHORIZED,
        FailureKind::TransportUnreachable | FailureKind::ProtocolError => StatusCode::BAD_GATEWAY,
        FailureKind::ExecutionError => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::PartialDecode => StatusCode::OK,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Config(err) => (StatusCode::BAD_REQUEST, "invalid_config", err.to_string()),
            ApiError::NotFound(name) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Устройство '{name}' не найдено"),
            ),
            ApiError::Failure(failure) => {
                let kind = failure.kind();
                (failure_status(kind), kind.as_str(), failure.to_string())
            }
        };

        if status.is_server_error() {
            tracing::warn!(error, %message, "Ошибка API");
        } else {
            tracing::debug!(error, %message, "Ошибка запроса API");
        }

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}
