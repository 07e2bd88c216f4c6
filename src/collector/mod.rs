//! Один раунд опроса: GET всех OID каталога одним запросом и сборка снимка

use std::time::{Duration, Instant};

use tracing::debug;

pub mod decode;
pub mod device_info;
pub mod scalar_collector;
pub mod types;

pub use device_info::DeviceIdentity;
pub use scalar_collector::{ScalarCollector, ScalarResult};
pub use types::{MeasuredValue, Measurement, MissingReason, Snapshot, SnapshotBuilder};

use crate::catalog::{Catalog, MetricDescriptor};
use crate::error::Failure;
use crate::snmp::{RawValue, Transport, TransportError};

/// Потолок на раунд по умолчанию
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(10);

/// Коллектор для сбора SNMP данных
pub struct SnmpCollector;

impl SnmpCollector {
    /// Выполняет ровно один раунд опроса. Блокирующий, вызывается из пула.
    ///
    /// Если v3 сессия устарела, она переоткрывается и раунд повторяется
    /// один раз. Других повторов здесь нет.
    pub fn poll<T: Transport + ?Sized>(
        transport: &mut T,
        catalog: &Catalog,
        round_timeout: Duration,
    ) -> Result<Snapshot, Failure> {
        let result = match Self::round(transport, catalog, round_timeout) {
            Err(TransportError::SessionStale) => {
                debug!("SNMPv3 сессия устарела, повторная синхронизация");
                transport.invalidate();
                Self::round(transport, catalog, round_timeout)
            }
            other => other,
        };

        result.map_err(|err| {
            // следующий раунд начнёт с новой сессии
            transport.invalidate();
            err.into_failure()
        })
    }

    fn round<T: Transport + ?Sized>(
        transport: &mut T,
        catalog: &Catalog,
        round_timeout: Duration,
    ) -> Result<Snapshot, TransportError> {
        let deadline = Instant::now() + round_timeout;
        let expired = || Instant::now() >= deadline;
        transport.connect()?;

        let descriptors: Vec<&MetricDescriptor> = catalog.iter().collect();
        let mut results = Vec::with_capacity(descriptors.len());
        if !descriptors.is_empty() {
            if expired() {
                return Err(Failure::Timeout(round_timeout).into());
            }
            let oids: Vec<&str> = descriptors.iter().map(|d| d.oid).collect();
            let values = transport.get_many(&oids)?;
            if values.len() != descriptors.len() {
                return Err(Failure::ProtocolError(format!(
                    "получено {} значений на {} OID",
                    values.len(),
                    descriptors.len()
                ))
                .into());
            }

            if values.iter().all(|v| matches!(v, RawValue::ErrorStatus(_))) {
                // v1-подобные агенты отвечают noSuchName на весь запрос
                debug!(oids = oids.len(), "Пакетный GET отклонён, опрос по одному OID");
                for descriptor in &descriptors {
                    if expired() {
                        return Err(Failure::Timeout(round_timeout).into());
                    }
                    results.push(ScalarCollector::collect(transport, descriptor)?);
                }
            } else {
                results.extend(
                    descriptors
                        .iter()
                        .zip(&values)
                        .map(|(descriptor, raw)| ScalarCollector::evaluate(descriptor, raw)),
                );
            }
        }

        let mut builder = SnapshotBuilder::new();
        let mut unsupported = 0;
        for (descriptor, result) in descriptors.iter().zip(results) {
            match result {
                ScalarResult::Decoded(measurement) => {
                    builder.insert(measurement);
                }
                ScalarResult::Missing(reason) => {
                    if matches!(reason, MissingReason::NotSupported { .. }) {
                        unsupported += 1;
                    }
                    debug!(metric = %descriptor.key, %reason, "OID не декодирован");
                    builder.miss(descriptor.key, reason);
                }
            }
        }

        // так выглядит неверная community v2c или v3 view без доступа
        if !descriptors.is_empty() && unsupported == descriptors.len() {
            return Err(Failure::AuthenticationFailed("устройство не вернуло данных".into()).into());
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::catalog::{MetricKey, Unit};

    /// Отвечает по таблице OID -> значение, остальное noSuchObject
    #[derive(Default)]
    struct ScriptedTransport {
        values: HashMap<&'static str, RawValue>,
        connect_results: Vec<Result<(), TransportError>>,
        fail_get: Option<TransportError>,
        /// Агент без multi-varbind GET: весь запрос получает noSuchName
        single_only: bool,
        batches: usize,
        gets: usize,
        connects: usize,
        invalidations: usize,
    }

    impl Transport for ScriptedTransport {
        fn connect(&mut self) -> Result<(), TransportError> {
            self.connects += 1;
            if self.connect_results.is_empty() {
                Ok(())
            } else {
                self.connect_results.remove(0)
            }
        }

        fn get(&mut self, oid: &str) -> Result<RawValue, TransportError> {
            self.gets += 1;
            if let Some(err) = self.fail_get.clone() {
                return Err(err);
            }
            Ok(self.values.get(oid).cloned().unwrap_or(RawValue::NoSuchObject))
        }

        fn get_many(&mut self, oids: &[&str]) -> Result<Vec<RawValue>, TransportError> {
            self.batches += 1;
            if let Some(err) = self.fail_get.clone() {
                return Err(err);
            }
            if self.single_only && oids.len() > 1 {
                return Ok(vec![RawValue::ErrorStatus(2); oids.len()]);
            }
            Ok(oids
                .iter()
                .map(|oid| self.values.get(oid).cloned().unwrap_or(RawValue::NoSuchObject))
                .collect())
        }

        fn invalidate(&mut self) {
            self.invalidations += 1;
        }
    }

    fn oid(key: MetricKey) -> &'static str {
        Catalog::apc().get(key).unwrap().oid
    }

    #[test]
    fn one_bad_oid_does_not_spoil_the_round() {
        let mut transport = ScriptedTransport::default();
        transport.values.insert(oid(MetricKey::BatteryCapacity), RawValue::Integer(87));
        transport.values.insert(oid(MetricKey::OutputStatus), RawValue::text("garbage"));

        let catalog = Catalog::apc().select(&[MetricKey::BatteryCapacity, MetricKey::OutputStatus]);
        let snapshot = SnmpCollector::poll(&mut transport, &catalog, DEFAULT_ROUND_TIMEOUT).unwrap();

        assert!(!snapshot.is_complete());
        let capacity = snapshot.get(MetricKey::BatteryCapacity).unwrap();
        assert_eq!(capacity.number(), Some(87.0));
        assert_eq!(capacity.unit, Unit::Percent);
        assert_eq!(snapshot.missing_keys(), vec![MetricKey::OutputStatus]);
    }

    #[test]
    fn round_is_one_request() {
        let mut transport = ScriptedTransport::default();
        transport.values.insert(oid(MetricKey::BatteryCapacity), RawValue::Integer(87));

        for _ in 0..3 {
            SnmpCollector::poll(&mut transport, Catalog::apc(), DEFAULT_ROUND_TIMEOUT).unwrap();
        }
        assert_eq!(transport.batches, 3);
        assert_eq!(transport.gets, 0);
    }

    #[test]
    fn rejected_batch_falls_back_to_single_gets() {
        let mut transport = ScriptedTransport {
            single_only: true,
            ..Default::default()
        };
        transport.values.insert(oid(MetricKey::BatteryCapacity), RawValue::Integer(87));
        transport.values.insert(oid(MetricKey::Model), RawValue::text("Smart-UPS 1500"));

        let catalog = Catalog::apc().select(&[MetricKey::BatteryCapacity, MetricKey::Model]);
        let snapshot = SnmpCollector::poll(&mut transport, &catalog, DEFAULT_ROUND_TIMEOUT).unwrap();
        assert!(snapshot.is_complete());
        assert_eq!(snapshot.get(MetricKey::BatteryCapacity).unwrap().number(), Some(87.0));
        assert_eq!(transport.batches, 1);
        assert_eq!(transport.gets, 2);
    }

    #[test]
    fn nothing_supported_means_auth_failure() {
        let mut transport = ScriptedTransport::default();
        let err = SnmpCollector::poll(&mut transport, Catalog::apc(), DEFAULT_ROUND_TIMEOUT).unwrap_err();
        assert!(matches!(err, Failure::AuthenticationFailed(_)));
        assert_eq!(transport.invalidations, 1);
    }

    #[test]
    fn stale_session_is_retried_once() {
        let mut transport = ScriptedTransport {
            connect_results: vec![Err(TransportError::SessionStale), Ok(())],
            ..Default::default()
        };
        transport.values.insert(oid(MetricKey::BatteryCapacity), RawValue::Integer(50));

        let catalog = Catalog::apc().select(&[MetricKey::BatteryCapacity]);
        let snapshot = SnmpCollector::poll(&mut transport, &catalog, DEFAULT_ROUND_TIMEOUT).unwrap();
        assert!(snapshot.is_complete());
        assert_eq!(transport.connects, 2);
        assert_eq!(transport.invalidations, 1);
    }

    #[test]
    fn stale_twice_is_auth_failure() {
        let mut transport = ScriptedTransport {
            connect_results: vec![
                Err(TransportError::SessionStale),
                Err(TransportError::SessionStale),
            ],
            ..Default::default()
        };
        let err = SnmpCollector::poll(&mut transport, Catalog::apc(), DEFAULT_ROUND_TIMEOUT).unwrap_err();
        assert!(matches!(err, Failure::AuthenticationFailed(_)));
        assert_eq!(transport.connects, 2);
    }

    #[test]
    fn transport_failure_aborts_round() {
        let mut transport = ScriptedTransport {
            fail_get: Some(Failure::Timeout(Duration::from_secs(5)).into()),
            ..Default::default()
        };
        let err = SnmpCollector::poll(&mut transport, Catalog::apc(), DEFAULT_ROUND_TIMEOUT).unwrap_err();
        assert_eq!(err, Failure::Timeout(Duration::from_secs(5)));
    }

    #[test]
    fn round_deadline() {
        let mut transport = ScriptedTransport::default();
        transport.values.insert(oid(MetricKey::Model), RawValue::text("Smart-UPS"));
        let err = SnmpCollector::poll(&mut transport, Catalog::apc(), Duration::ZERO).unwrap_err();
        assert_eq!(err, Failure::Timeout(Duration::ZERO));
    }
}
