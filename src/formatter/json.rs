use chrono::Utc;
use serde::Serialize;

use crate::catalog::MetricKey;
use crate::collector::{DeviceIdentity, Snapshot};
use crate::coordinator::{CoordinatorState, HealthStatus, Phase};
use crate::error::{Failure, FailureKind};
use crate::projection::{Entity, EntityValue, Reading};

/// Состояние устройства для вывода и HTTP API
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStateJson {
    pub device: String,
    pub status: HealthStatus,
    pub phase: Phase,
    pub timestamp: String,
    pub consecutive_failures: u32,
    pub polls: u64,
    pub last_error: Option<ErrorInfo>,
    pub last_success: Option<String>,
    /// Сколько секунд назад снят снимок
    pub age_secs: Option<i64>,
    pub next_poll_in_secs: Option<u64>,
    pub complete: Option<bool>,
    pub entities: Vec<EntityJson>,
    pub missing: Vec<MissingJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&Failure> for ErrorInfo {
    fn from(failure: &Failure) -> Self {
        Self {
            kind: failure.kind(),
            message: failure.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityJson {
    pub name: &'static str,
    /// `null`, если метрики нет в снимке
    pub value: Option<EntityValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingJson {
    pub metric: MetricKey,
    pub reason: String,
}

/// Полный снимок одного раунда
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotJson {
    pub device: String,
    pub captured_at: String,
    pub complete: bool,
    pub identity: DeviceIdentity,
    pub measurements: Vec<MeasurementJson>,
    pub missing: Vec<MissingJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasurementJson {
    pub metric: MetricKey,
    pub value: Reading,
    pub unit: &'static str,
}

/// JSON форматтер для состояния координатора и снимков
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_state(device: &str, state: &CoordinatorState, entities: &[Entity]) -> DeviceStateJson {
        let now = Utc::now();
        let snapshot = state.snapshot.as_deref();

        DeviceStateJson {
            device: device.to_string(),
            status: state.status(),
            phase: state.phase,
            timestamp: now.to_rfc3339(),
            consecutive_failures: state.consecutive_failures,
            polls: state.polls,
            last_error: state.last_error.as_ref().map(ErrorInfo::from),
            last_success: state.last_success.map(|t| t.to_rfc3339()),
            age_secs: state.snapshot_age(now).map(|age| age.num_seconds()),
            next_poll_in_secs: state.next_poll.map(|at| {
                at.saturating_duration_since(tokio::time::Instant::now())
                    .as_secs()
            }),
            complete: snapshot.map(Snapshot::is_complete),
            entities: entities
                .iter()
                .map(|entity| EntityJson {
                    name: entity.name(),
                    value: snapshot.and_then(|s| entity.project(s)),
                })
                .collect(),
            missing: snapshot.map(Self::format_missing).unwrap_or_default(),
        }
    }

    pub fn format_snapshot(device: &str, snapshot: &Snapshot) -> SnapshotJson {
        SnapshotJson {
            device: device.to_string(),
            captured_at: snapshot.captured_at().to_rfc3339(),
            complete: snapshot.is_complete(),
            identity: DeviceIdentity::from_snapshot(snapshot),
            measurements: snapshot
                .measurements()
                .map(|m| MeasurementJson {
                    metric: m.key,
                    value: Reading::from(m),
                    unit: m.unit.symbol(),
                })
                .collect(),
            missing: Self::format_missing(snapshot),
        }
    }

    fn format_missing(snapshot: &Snapshot) -> Vec<MissingJson> {
        snapshot
            .missing()
            .map(|(metric, reason)| MissingJson {
                metric,
                reason: reason.to_string(),
            })
            .collect()
    }

    /// Сериализация с отступами
    pub fn to_json_string<T: Serialize>(value: &T) -> serde_json::Result<String> {
        serde_json::to_string_pretty(value)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::catalog::Unit;
    use crate::collector::{MeasuredValue, Measurement, MissingReason, SnapshotBuilder};
    use crate::projection::entities;

    fn state_with_capacity() -> CoordinatorState {
        let mut builder = SnapshotBuilder::new();
        builder
            .insert(Measurement {
                key: MetricKey::BatteryCapacity,
                value: MeasuredValue::Number(87.0),
                unit: Unit::Percent,
            })
            .miss(
                MetricKey::OutputPower,
                MissingReason::NotSupported { detail: "noSuchObject".into() },
            );
        let mut state = CoordinatorState::default();
        state.record_success(builder.build());
        state
    }

    #[test]
    fn state_json_shape() {
        let state = state_with_capacity();
        let json = serde_json::to_value(JsonFormatter::format_state(
            "server-room",
            &state,
            &entities(&[MetricKey::BatteryCapacity, MetricKey::OutputPower]),
        ))
        .unwrap();

        assert_eq!(json["device"], "server-room");
        assert_eq!(json["status"], "partial");
        assert_eq!(json["complete"], false);
        assert_eq!(json["entities"][0], json!({"name": "battery_capacity", "value": {"value": 87.0, "unit": "%"}}));
        assert_eq!(json["entities"][1]["value"], serde_json::Value::Null);
        assert_eq!(json["missing"][0]["metric"], "output_power");
    }

    #[test]
    fn error_is_reported_with_kind() {
        let mut state = state_with_capacity();
        state.record_failure(Failure::Timeout(Duration::from_secs(10)));
        let json = serde_json::to_value(JsonFormatter::format_state("ups", &state, &[])).unwrap();

        assert_eq!(json["status"], "failing");
        assert_eq!(json["last_error"]["kind"], "timeout");
        assert_eq!(json["consecutive_failures"], 1);
    }
}
