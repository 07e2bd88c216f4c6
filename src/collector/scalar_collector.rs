use tracing::trace;

use super::decode::decode;
use super::types::{Measurement, MissingReason};
use crate::catalog::MetricDescriptor;
use crate::snmp::{RawValue, Transport, TransportError};

/// Результат опроса одного скаляра
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarResult {
    Decoded(Measurement),
    Missing(MissingReason),
}

/// Модуль для сбора скалярных SNMP значений
pub struct ScalarCollector;

impl ScalarCollector {
    /// GET одного OID каталога. Ошибка транспорта прерывает раунд,
    /// ошибка декодирования касается только этого OID.
    pub fn collect<T: Transport + ?Sized>(
        transport: &mut T,
        descriptor: &MetricDescriptor,
    ) -> Result<ScalarResult, TransportError> {
        let raw = transport.get(descriptor.oid)?;
        Ok(Self::evaluate(descriptor, &raw))
    }

    /// Декодирует значение, уже полученное пакетным GET
    pub fn evaluate(descriptor: &MetricDescriptor, raw: &RawValue) -> ScalarResult {
        trace!(metric = %descriptor.key, oid = descriptor.oid, ?raw, "SNMP GET");
        match decode(descriptor, raw) {
            Ok(measurement) => ScalarResult::Decoded(measurement),
            Err(reason) => ScalarResult::Missing(reason),
        }
    }
}
