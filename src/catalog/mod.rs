use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub mod states;

pub use states::{
    BatteryReplace, BatteryStatus, OutputStatus, SelfTestResult, StateKind, StateValue,
    TransferCause,
};

/// Стабильный ключ метрики
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Model,
    Name,
    Firmware,
    Serial,
    ManufactureDate,
    BatteryStatus,
    TimeOnBattery,
    BatteryCapacity,
    BatteryTemperature,
    BatteryRuntime,
    BatteryReplace,
    BatteryVoltage,
    InputVoltage,
    InputFrequency,
    LastTransferCause,
    #[serde(alias = "ups_status")]
    OutputStatus,
    OutputVoltage,
    OutputFrequency,
    OutputLoad,
    OutputCurrent,
    OutputPower,
    SelfTestResult,
}

impl MetricKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKey::Model => "model",
            MetricKey::Name => "name",
            MetricKey::Firmware => "firmware",
            MetricKey::Serial => "serial",
            MetricKey::ManufactureDate => "manufacture_date",
            MetricKey::BatteryStatus => "battery_status",
            MetricKey::TimeOnBattery => "time_on_battery",
            MetricKey::BatteryCapacity => "battery_capacity",
            MetricKey::BatteryTemperature => "battery_temperature",
            MetricKey::BatteryRuntime => "battery_runtime",
            MetricKey::BatteryReplace => "battery_replace",
            MetricKey::BatteryVoltage => "battery_voltage",
            MetricKey::InputVoltage => "input_voltage",
            MetricKey::InputFrequency => "input_frequency",
            MetricKey::LastTransferCause => "last_transfer_cause",
            MetricKey::OutputStatus => "output_status",
            MetricKey::OutputVoltage => "output_voltage",
            MetricKey::OutputFrequency => "output_frequency",
            MetricKey::OutputLoad => "output_load",
            MetricKey::OutputCurrent => "output_current",
            MetricKey::OutputPower => "output_power",
            MetricKey::SelfTestResult => "self_test_result",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "ups_status" - старое имя сенсора статуса выхода
        if s == "ups_status" {
            return Ok(MetricKey::OutputStatus);
        }
        APC_CATALOG
            .iter()
            .map(|d| d.key)
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownMetric(s.to_string()))
    }
}

/// Единица измерения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    None,
    Percent,
    Celsius,
    Volt,
    Hertz,
    Ampere,
    Watt,
    Seconds,
    Minutes,
}

impl Unit {
    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Percent => "%",
            Unit::Celsius => "°C",
            Unit::Volt => "V",
            Unit::Hertz => "Hz",
            Unit::Ampere => "A",
            Unit::Watt => "W",
            Unit::Seconds => "s",
            Unit::Minutes => "min",
        }
    }
}

/// Правило декодирования сырого значения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    /// OCTET STRING как текст
    Text,
    /// Целое с фиксированной точкой: значение = raw / divisor.
    /// `min`/`max` - допустимый диапазон raw
    Scaled {
        unit: Unit,
        divisor: u16,
        min: i64,
        max: i64,
    },
    /// TimeTicks (сотые доли секунды) в секунды или минуты
    Timeticks(Unit),
    /// Код перечисления
    State(StateKind),
}

impl DecodeRule {
    pub const fn unit(self) -> Unit {
        match self {
            DecodeRule::Text | DecodeRule::State(_) => Unit::None,
            DecodeRule::Scaled { unit, .. } | DecodeRule::Timeticks(unit) => unit,
        }
    }
}

const fn whole(unit: Unit, min: i64, max: i64) -> DecodeRule {
    DecodeRule::Scaled { unit, divisor: 1, min, max }
}

const fn tenths(unit: Unit) -> DecodeRule {
    DecodeRule::Scaled { unit, divisor: 10, min: 0, max: i64::MAX }
}

/// Описание одной метрики каталога
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub key: MetricKey,
    pub oid: &'static str,
    pub rule: DecodeRule,
}

impl MetricDescriptor {
    const fn new(key: MetricKey, oid: &'static str, rule: DecodeRule) -> Self {
        Self { key, oid, rule }
    }

    pub const fn unit(&self) -> Unit {
        self.rule.unit()
    }
}

const UNBOUNDED: i64 = i64::MAX;

// PowerNet MIB, ветка upsBasic/upsAdv/upsHighPrec (1.3.6.1.4.1.318.1.1.1)
const APC_DESCRIPTORS: &[MetricDescriptor] = &[
    // Идентификация
    MetricDescriptor::new(MetricKey::Model, "1.3.6.1.4.1.318.1.1.1.1.1.1.0", DecodeRule::Text),
    MetricDescriptor::new(MetricKey::Name, "1.3.6.1.4.1.318.1.1.1.1.1.2.0", DecodeRule::Text),
    MetricDescriptor::new(MetricKey::Firmware, "1.3.6.1.4.1.318.1.1.1.1.2.1.0", DecodeRule::Text),
    MetricDescriptor::new(MetricKey::Serial, "1.3.6.1.4.1.318.1.1.1.1.2.2.0", DecodeRule::Text),
    MetricDescriptor::new(MetricKey::ManufactureDate, "1.3.6.1.4.1.318.1.1.1.1.2.3.0", DecodeRule::Text),
    // Батарея
    MetricDescriptor::new(MetricKey::BatteryStatus, "1.3.6.1.4.1.318.1.1.1.2.1.1.0", DecodeRule::State(StateKind::BatteryStatus)),
    MetricDescriptor::new(MetricKey::TimeOnBattery, "1.3.6.1.4.1.318.1.1.1.2.1.2.0", DecodeRule::Timeticks(Unit::Seconds)),
    MetricDescriptor::new(MetricKey::BatteryCapacity, "1.3.6.1.4.1.318.1.1.1.2.2.1.0", whole(Unit::Percent, 0, 100)),
    MetricDescriptor::new(MetricKey::BatteryTemperature, "1.3.6.1.4.1.318.1.1.1.2.2.2.0", whole(Unit::Celsius, -50, 150)),
    MetricDescriptor::new(MetricKey::BatteryRuntime, "1.3.6.1.4.1.318.1.1.1.2.2.3.0", DecodeRule::Timeticks(Unit::Minutes)),
    MetricDescriptor::new(MetricKey::BatteryReplace, "1.3.6.1.4.1.318.1.1.1.2.2.4.0", DecodeRule::State(StateKind::BatteryReplace)),
    MetricDescriptor::new(MetricKey::BatteryVoltage, "1.3.6.1.4.1.318.1.1.1.2.2.8.0", whole(Unit::Volt, 0, UNBOUNDED)),
    // Вход
    MetricDescriptor::new(MetricKey::InputVoltage, "1.3.6.1.4.1.318.1.1.1.3.3.1.0", tenths(Unit::Volt)),
    MetricDescriptor::new(MetricKey::InputFrequency, "1.3.6.1.4.1.318.1.1.1.3.3.4.0", tenths(Unit::Hertz)),
    MetricDescriptor::new(MetricKey::LastTransferCause, "1.3.6.1.4.1.318.1.1.1.3.2.5.0", DecodeRule::State(StateKind::TransferCause)),
    // Выход
    MetricDescriptor::new(MetricKey::OutputStatus, "1.3.6.1.4.1.318.1.1.1.4.1.1.0", DecodeRule::State(StateKind::OutputStatus)),
    MetricDescriptor::new(MetricKey::OutputVoltage, "1.3.6.1.4.1.318.1.1.1.4.3.1.0", tenths(Unit::Volt)),
    MetricDescriptor::new(MetricKey::OutputFrequency, "1.3.6.1.4.1.318.1.1.1.4.3.2.0", tenths(Unit::Hertz)),
    MetricDescriptor::new(MetricKey::OutputLoad, "1.3.6.1.4.1.318.1.1.1.4.2.3.0", whole(Unit::Percent, 0, UNBOUNDED)),
    MetricDescriptor::new(MetricKey::OutputCurrent, "1.3.6.1.4.1.318.1.1.1.4.3.4.0", tenths(Unit::Ampere)),
    MetricDescriptor::new(MetricKey::OutputPower, "1.3.6.1.4.1.318.1.1.1.4.2.8.0", whole(Unit::Watt, 0, UNBOUNDED)),
    // Самотестирование
    MetricDescriptor::new(MetricKey::SelfTestResult, "1.3.6.1.4.1.318.1.1.1.7.2.3.0", DecodeRule::State(StateKind::SelfTestResult)),
];

/// Каталог APC, инициализируется один раз на процесс
pub static APC_CATALOG: LazyLock<Catalog> = LazyLock::new(|| Catalog {
    entries: APC_DESCRIPTORS.to_vec(),
});

/// Упорядоченный набор опрашиваемых метрик.
/// После создания не меняется; `select` строит новый каталог.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<MetricDescriptor>,
}

impl Catalog {
    pub fn apc() -> &'static Catalog {
        &APC_CATALOG
    }

    /// Подмножество в исходном порядке каталога
    pub fn select(&self, keys: &[MetricKey]) -> Catalog {
        Catalog {
            entries: self
                .entries
                .iter()
                .filter(|d| keys.contains(&d.key))
                .copied()
                .collect(),
        }
    }

    pub fn get(&self, key: MetricKey) -> Option<&MetricDescriptor> {
        self.entries.iter().find(|d| d.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = MetricKey> + '_ {
        self.entries.iter().map(|d| d.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Сенсоры, публикуемые по умолчанию
pub const DEFAULT_SENSORS: &[MetricKey] = &[
    MetricKey::BatteryCapacity,
    MetricKey::BatteryRuntime,
    MetricKey::OutputLoad,
    MetricKey::OutputPower,
    MetricKey::LastTransferCause,
    MetricKey::OutputStatus,
];
