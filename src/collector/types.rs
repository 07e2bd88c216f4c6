use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{MetricKey, StateValue, Unit};
use crate::error::Failure;

/// Декодированное значение метрики
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasuredValue {
    Number(f64),
    Text(String),
    State(StateValue),
}

impl fmt::Display for MeasuredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasuredValue::Number(v) => write!(f, "{v}"),
            MeasuredValue::Text(s) => f.write_str(s),
            MeasuredValue::State(s) => f.write_str(s.as_str()),
        }
    }
}

/// Одно измерение. Создаётся в раунде опроса и больше не меняется.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub key: MetricKey,
    pub value: MeasuredValue,
    pub unit: Unit,
}

impl Measurement {
    pub fn number(&self) -> Option<f64> {
        match self.value {
            MeasuredValue::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn state(&self) -> Option<StateValue> {
        match self.value {
            MeasuredValue::State(s) => Some(s),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            MeasuredValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Почему OID не попал в снимок
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MissingReason {
    /// noSuchObject / noSuchInstance / endOfMibView / error-status
    NotSupported { detail: String },
    UnexpectedType { got: String },
    /// Код вне закрытого перечисления
    UnknownEnumValue { code: i64 },
    OutOfRange { raw: i64 },
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingReason::NotSupported { detail } => write!(f, "не поддерживается агентом ({detail})"),
            MissingReason::UnexpectedType { got } => write!(f, "неожиданный тип {got}"),
            MissingReason::UnknownEnumValue { code } => write!(f, "неизвестное значение {code}"),
            MissingReason::OutOfRange { raw } => write!(f, "значение {raw} вне диапазона"),
        }
    }
}

/// Неизменяемый результат одного раунда опроса
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    captured_at: DateTime<Utc>,
    measurements: BTreeMap<MetricKey, Measurement>,
    missing: BTreeMap<MetricKey, MissingReason>,
}

impl Snapshot {
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn get(&self, key: MetricKey) -> Option<&Measurement> {
        self.measurements.get(&key)
    }

    pub fn number(&self, key: MetricKey) -> Option<f64> {
        self.get(key).and_then(Measurement::number)
    }

    pub fn state(&self, key: MetricKey) -> Option<StateValue> {
        self.get(key).and_then(Measurement::state)
    }

    pub fn text(&self, key: MetricKey) -> Option<&str> {
        self.get(key).and_then(Measurement::text)
    }

    pub fn measurements(&self) -> impl Iterator<Item = &Measurement> {
        self.measurements.values()
    }

    pub fn missing(&self) -> impl Iterator<Item = (MetricKey, &MissingReason)> {
        self.missing.iter().map(|(k, r)| (*k, r))
    }

    pub fn missing_keys(&self) -> Vec<MetricKey> {
        self.missing.keys().copied().collect()
    }

    /// Все OID каталога декодированы
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// `PartialDecode` с пропущенными ключами для диагностики
    pub fn partial_decode(&self) -> Option<Failure> {
        (!self.is_complete()).then(|| Failure::PartialDecode(self.missing_keys()))
    }
}

/// Собирает снимок по мере ответа агента
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    measurements: BTreeMap<MetricKey, Measurement>,
    missing: BTreeMap<MetricKey, MissingReason>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, measurement: Measurement) -> &mut Self {
        self.missing.remove(&measurement.key);
        self.measurements.insert(measurement.key, measurement);
        self
    }

    pub fn miss(&mut self, key: MetricKey, reason: MissingReason) -> &mut Self {
        self.measurements.remove(&key);
        self.missing.insert(key, reason);
        self
    }

    pub fn build(self) -> Snapshot {
        self.build_at(Utc::now())
    }

    pub fn build_at(self, captured_at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            captured_at,
            measurements: self.measurements,
            missing: self.missing,
        }
    }
}
