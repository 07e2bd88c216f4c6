use std::io;
use std::time::Duration;

use snmp2::v3::AuthErrorKind;
use snmp2::{Oid, Pdu};
use tracing::debug;

use super::oid::parse_oid;
use super::value::RawValue;
use crate::error::Failure;

/// noAccess
const STATUS_NO_ACCESS: u32 = 6;
/// authorizationError
const STATUS_AUTHORIZATION_ERROR: u32 = 16;

/// Сколько раз запрос отправляется повторно, если ответ не пришёл
const LOST_REPLY_RETRIES: u32 = 1;

/// Ошибка одного запроса
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// USM состояние сессии больше не годится: агент перезагрузился или
    /// повтор после обновления engine boots/time снова его потребовал.
    /// Нужна новая сессия с discovery.
    SessionStale,
    Failed(Failure),
}

impl From<Failure> for TransportError {
    fn from(failure: Failure) -> Self {
        TransportError::Failed(failure)
    }
}

impl TransportError {
    /// Для вызывающего кода, которому не нужен повтор
    pub fn into_failure(self) -> Failure {
        match self {
            TransportError::SessionStale => {
                Failure::AuthenticationFailed("сессия SNMPv3 устарела после повтора".into())
            }
            TransportError::Failed(failure) => failure,
        }
    }
}

/// Блокирующий транспорт к одному агенту.
///
/// Вызывается только из потока пула исполнителей, одновременно не больше
/// одного вызова на устройство.
pub trait Transport: Send {
    /// Открывает сессию, для v3 выполняет discovery. Повторный вызов
    /// при уже открытой сессии ничего не делает.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// GET одного OID
    fn get(&mut self, oid: &str) -> Result<RawValue, TransportError>;

    /// GET нескольких OID, значения в порядке запроса.
    ///
    /// Если агент отклонил запрос целиком, каждому OID соответствует
    /// `RawValue::ErrorStatus`. Транспорт без multi-varbind GET
    /// опрашивает OID по одному.
    fn get_many(&mut self, oids: &[&str]) -> Result<Vec<RawValue>, TransportError> {
        oids.iter().map(|oid| self.get(oid)).collect()
    }

    /// Сбрасывает сессию, следующий `connect` откроет новую
    fn invalidate(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self) -> Result<(), TransportError> {
        (**self).connect()
    }

    fn get(&mut self, oid: &str) -> Result<RawValue, TransportError> {
        (**self).get(oid)
    }

    fn get_many(&mut self, oids: &[&str]) -> Result<Vec<RawValue>, TransportError> {
        (**self).get_many(oids)
    }

    fn invalidate(&mut self) {
        (**self).invalidate()
    }
}

/// Ошибка создания сокета или резолва адреса
pub(crate) fn open_failure(err: io::Error, target: &str) -> Failure {
    Failure::TransportUnreachable(format!("{target}: {err}"))
}

pub(crate) fn parse_oids(oids: &[&str]) -> Result<Vec<Oid<'static>>, TransportError> {
    oids.iter()
        .map(|oid| parse_oid(oid).map_err(|e| Failure::ProtocolError(e.to_string()).into()))
        .collect()
}

/// Отправляет запрос на той же сессии, пока не будет ответа.
///
/// Потерянный ответ повторяется `LOST_REPLY_RETRIES` раз. `AuthUpdated`
/// повторяется один раз: snmp2 уже записал engine boots/time из report
/// агента, и тот же запрос на той же сессии должен пройти.
pub(crate) fn send<R>(mut request: impl FnMut() -> Result<R, snmp2::Error>) -> Result<R, snmp2::Error> {
    let mut lost = 0;
    let mut updated = false;
    loop {
        match request() {
            Err(snmp2::Error::Receive) if lost < LOST_REPLY_RETRIES => {
                lost += 1;
                debug!(attempt = lost, "Ответ не получен, повтор запроса");
            }
            Err(snmp2::Error::AuthUpdated) if !updated => {
                updated = true;
                debug!("Агент обновил USM состояние, повтор на той же сессии");
            }
            other => return other,
        }
    }
}

pub(crate) fn classify(err: snmp2::Error, timeout: Duration) -> TransportError {
    match err {
        // обновление после повтора или перезагрузка агента
        snmp2::Error::AuthUpdated
        | snmp2::Error::AuthFailure(
            AuthErrorKind::EngineBootsMismatch | AuthErrorKind::EngineTimeMismatch,
        ) => TransportError::SessionStale,
        snmp2::Error::AuthFailure(AuthErrorKind::KeyExtensionRequired) => {
            Failure::ProtocolError("пара auth/priv требует расширения ключа".into()).into()
        }
        snmp2::Error::AuthFailure(kind) => Failure::AuthenticationFailed(kind.to_string()).into(),
        snmp2::Error::CommunityMismatch => {
            Failure::AuthenticationFailed("community в ответе не совпадает".into()).into()
        }
        snmp2::Error::Send => Failure::TransportUnreachable("ошибка отправки".into()).into(),
        // таймаут сокета и ICMP unreachable приходят одинаково
        snmp2::Error::Receive => Failure::Timeout(timeout).into(),
        other => Failure::ProtocolError(format!("{other:?}")).into(),
    }
}

/// Значения ответа на GET в порядке запроса
pub(crate) fn response_values(pdu: Pdu<'_>, expected: usize) -> Result<Vec<RawValue>, TransportError> {
    match pdu.error_status {
        0 => {}
        STATUS_NO_ACCESS | STATUS_AUTHORIZATION_ERROR => {
            return Err(Failure::AuthenticationFailed(format!(
                "агент ответил error-status {}",
                pdu.error_status
            ))
            .into());
        }
        // noSuchName, tooBig, genErr относятся ко всему запросу
        status => return Ok(vec![RawValue::ErrorStatus(status); expected]),
    }

    let values: Vec<RawValue> = pdu
        .varbinds
        .map(|(_, value)| RawValue::from(&value))
        .collect();
    if values.len() != expected {
        return Err(Failure::ProtocolError(format!(
            "в ответе {} значений вместо {expected}",
            values.len()
        ))
        .into());
    }
    Ok(values)
}

/// Единственное значение ответа на одиночный GET
pub(crate) fn single(mut values: Vec<RawValue>) -> Result<RawValue, TransportError> {
    values
        .pop()
        .ok_or_else(|| Failure::ProtocolError("SNMP ответ пустой".into()).into())
}
