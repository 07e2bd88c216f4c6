//! Чистые проекции снимка для потребителей: числовые сенсоры
//! и бинарные индикаторы

use serde::Serialize;

use crate::catalog::{BatteryReplace, BatteryStatus, MetricKey, OutputStatus, StateValue};
use crate::collector::{MeasuredValue, Measurement, Snapshot};

/// Бинарный индикатор, вычисляемый из состояния
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryIndicator {
    OnBattery,
    ReplaceBattery,
    LowBattery,
}

impl BinaryIndicator {
    pub const ALL: &'static [BinaryIndicator] = &[
        BinaryIndicator::OnBattery,
        BinaryIndicator::ReplaceBattery,
        BinaryIndicator::LowBattery,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryIndicator::OnBattery => "on_battery",
            BinaryIndicator::ReplaceBattery => "replace_battery",
            BinaryIndicator::LowBattery => "low_battery",
        }
    }

    /// Метрика, из которой считается индикатор
    pub const fn source(self) -> MetricKey {
        match self {
            BinaryIndicator::OnBattery => MetricKey::OutputStatus,
            BinaryIndicator::ReplaceBattery => MetricKey::BatteryReplace,
            BinaryIndicator::LowBattery => MetricKey::BatteryStatus,
        }
    }

    /// `None`, если исходной метрики нет в снимке
    pub fn evaluate(self, snapshot: &Snapshot) -> Option<bool> {
        let state = snapshot.state(self.source())?;
        Some(match (self, state) {
            (BinaryIndicator::OnBattery, StateValue::Output(s)) => s == OutputStatus::OnBattery,
            (BinaryIndicator::ReplaceBattery, StateValue::Replace(s)) => s == BatteryReplace::Needed,
            (BinaryIndicator::LowBattery, StateValue::Battery(s)) => s == BatteryStatus::Low,
            _ => return None,
        })
    }
}

/// Значение для отображения
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
    State(&'static str),
}

impl From<&Measurement> for Reading {
    fn from(m: &Measurement) -> Self {
        match &m.value {
            MeasuredValue::Number(v) => Reading::Number(crate::collector::decode::round1(*v)),
            MeasuredValue::Text(s) => Reading::Text(s.clone()),
            MeasuredValue::State(s) => Reading::State(s.as_str()),
        }
    }
}

/// Сущность потребителя: закрытый набор вариантов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Sensor(MetricKey),
    Binary(BinaryIndicator),
}

/// Спроецированное значение сущности
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityValue {
    Reading { value: Reading, unit: &'static str },
    Flag(bool),
}

impl Entity {
    pub fn name(&self) -> &'static str {
        match self {
            Entity::Sensor(key) => key.as_str(),
            Entity::Binary(indicator) => indicator.as_str(),
        }
    }

    pub fn project(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        match self {
            Entity::Sensor(key) => snapshot.get(*key).map(|m| EntityValue::Reading {
                value: Reading::from(m),
                unit: m.unit.symbol(),
            }),
            Entity::Binary(indicator) => indicator.evaluate(snapshot).map(EntityValue::Flag),
        }
    }
}

/// Выбранные сенсоры и все бинарные индикаторы
pub fn entities(sensors: &[MetricKey]) -> Vec<Entity> {
    sensors
        .iter()
        .copied()
        .map(Entity::Sensor)
        .chain(BinaryIndicator::ALL.iter().copied().map(Entity::Binary))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Unit;
    use crate::collector::SnapshotBuilder;

    fn state(key: MetricKey, value: StateValue) -> Measurement {
        Measurement {
            key,
            value: MeasuredValue::State(value),
            unit: Unit::None,
        }
    }

    #[test]
    fn indicators_follow_states() {
        let mut builder = SnapshotBuilder::new();
        builder
            .insert(state(MetricKey::OutputStatus, StateValue::Output(OutputStatus::OnBattery)))
            .insert(state(MetricKey::BatteryStatus, StateValue::Battery(BatteryStatus::Normal)));
        let snapshot = builder.build();

        assert_eq!(BinaryIndicator::OnBattery.evaluate(&snapshot), Some(true));
        assert_eq!(BinaryIndicator::LowBattery.evaluate(&snapshot), Some(false));
        assert_eq!(BinaryIndicator::ReplaceBattery.evaluate(&snapshot), None);
    }

    #[test]
    fn sensor_projection_carries_unit() {
        let mut builder = SnapshotBuilder::new();
        builder.insert(Measurement {
            key: MetricKey::BatteryRuntime,
            value: MeasuredValue::Number(45.56),
            unit: Unit::Minutes,
        });
        let snapshot = builder.build();

        let value = Entity::Sensor(MetricKey::BatteryRuntime).project(&snapshot);
        assert_eq!(
            value,
            Some(EntityValue::Reading {
                value: Reading::Number(45.6),
                unit: "min"
            })
        );
        assert_eq!(Entity::Sensor(MetricKey::OutputLoad).project(&snapshot), None);
    }

    #[test]
    fn entity_list() {
        let list = entities(&[MetricKey::BatteryCapacity]);
        assert_eq!(list.len(), 4);
        assert_eq!(list[0].name(), "battery_capacity");
        assert_eq!(list[3].name(), "low_battery");
    }
}
