//! Сценарный транспорт: каждый раунд (connect) берёт следующее поведение

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use apc_ups_snmp::catalog::{Catalog, MetricKey};
use apc_ups_snmp::error::Failure;
use apc_ups_snmp::snmp::{RawValue, Transport, TransportError};

#[derive(Debug, Clone)]
pub enum Round {
    /// Агент отвечает по таблице, остальные OID - noSuchObject
    Respond(HashMap<String, RawValue>),
    /// Раунд обрывается на первом GET
    FailGet(Failure),
    /// Не удаётся открыть сессию
    FailConnect(Failure),
}

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Round>>>,
    current: Option<Round>,
    pub rounds: Arc<Mutex<usize>>,
}

impl ScriptedTransport {
    pub fn new(rounds: impl IntoIterator<Item = Round>) -> Self {
        Self {
            script: Arc::new(Mutex::new(rounds.into_iter().collect())),
            ..Default::default()
        }
    }

    pub fn rounds(&self) -> usize {
        *self.rounds.lock().unwrap()
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        *self.rounds.lock().unwrap() += 1;
        let round = self.script.lock().unwrap().pop_front();
        match round {
            Some(Round::FailConnect(failure)) => Err(failure.into()),
            other => {
                // последнее поведение повторяется, если сценарий кончился
                if other.is_some() {
                    self.current = other;
                }
                Ok(())
            }
        }
    }

    fn get(&mut self, oid: &str) -> Result<RawValue, TransportError> {
        match &self.current {
            Some(Round::Respond(values)) => Ok(values.get(oid).cloned().unwrap_or(RawValue::NoSuchObject)),
            Some(Round::FailGet(failure)) => Err(failure.clone().into()),
            _ => Ok(RawValue::NoSuchObject),
        }
    }

    fn invalidate(&mut self) {}
}

fn oid(key: MetricKey) -> String {
    Catalog::apc().get(key).map(|d| d.oid.to_string()).unwrap()
}

/// Исправный Smart-UPS на сети, заряд 87%
pub fn healthy_ups() -> HashMap<String, RawValue> {
    use MetricKey::*;
    [
        (Model, RawValue::text("Smart-UPS 1500")),
        (Name, RawValue::text("server-room")),
        (Firmware, RawValue::text("UPS 09.3 (ID18)")),
        (Serial, RawValue::text("AS1234567890")),
        (ManufactureDate, RawValue::text("03/15/2021")),
        (BatteryStatus, RawValue::Integer(2)),
        (TimeOnBattery, RawValue::Timeticks(0)),
        (BatteryCapacity, RawValue::Integer(87)),
        (BatteryTemperature, RawValue::Unsigned(27)),
        (BatteryRuntime, RawValue::Timeticks(273_000)),
        (BatteryReplace, RawValue::Integer(1)),
        (BatteryVoltage, RawValue::Integer(27)),
        (InputVoltage, RawValue::Unsigned(2304)),
        (InputFrequency, RawValue::Unsigned(500)),
        (LastTransferCause, RawValue::Integer(9)),
        (OutputStatus, RawValue::Integer(2)),
        (OutputVoltage, RawValue::Unsigned(2300)),
        (OutputFrequency, RawValue::Unsigned(500)),
        (OutputLoad, RawValue::Unsigned(34)),
        (OutputCurrent, RawValue::Unsigned(21)),
        (OutputPower, RawValue::Unsigned(310)),
        (SelfTestResult, RawValue::Integer(1)),
    ]
    .into_iter()
    .map(|(key, value)| (oid(key), value))
    .collect()
}

pub const ROUND_TIMEOUT: Duration = Duration::from_secs(5);
