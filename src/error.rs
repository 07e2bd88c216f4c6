use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::MetricKey;

/// Класс ошибки опроса, без подробностей
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TransportUnreachable,
    Timeout,
    AuthenticationFailed,
    ProtocolError,
    PartialDecode,
    ExecutionError,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureKind::TransportUnreachable => "transport_unreachable",
            FailureKind::Timeout => "timeout",
            FailureKind::AuthenticationFailed => "authentication_failed",
            FailureKind::ProtocolError => "protocol_error",
            FailureKind::PartialDecode => "partial_decode",
            FailureKind::ExecutionError => "execution_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ошибка раунда опроса.
///
/// Клиент возвращает её без изменений через пул исполнителей до
/// координатора. `PartialDecode` не является фатальной: раунд прошёл,
/// но часть OID не декодирована, снимок при этом всё равно возвращается.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// Хост недоступен, неверный порт, ошибка сокета
    #[error("Устройство недоступно: {0}")]
    TransportUnreachable(String),

    /// Нет ответа в пределах раунда
    #[error("Нет ответа от устройства за {}с", .0.as_secs_f32())]
    Timeout(Duration),

    /// Отклонены учётные данные v3 или community v2c
    #[error("Ошибка аутентификации: {0}")]
    AuthenticationFailed(String),

    /// Ответ не удалось разобрать
    #[error("Некорректный ответ SNMP: {0}")]
    ProtocolError(String),

    #[error("Не декодированы метрики: {}", join_keys(.0))]
    PartialDecode(Vec<MetricKey>),

    /// Пул исполнителей не принял задачу
    #[error("Не удалось выполнить опрос: {0}")]
    ExecutionError(String),
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::TransportUnreachable(_) => FailureKind::TransportUnreachable,
            Failure::Timeout(_) => FailureKind::Timeout,
            Failure::AuthenticationFailed(_) => FailureKind::AuthenticationFailed,
            Failure::ProtocolError(_) => FailureKind::ProtocolError,
            Failure::PartialDecode(_) => FailureKind::PartialDecode,
            Failure::ExecutionError(_) => FailureKind::ExecutionError,
        }
    }
}

fn join_keys(keys: &[MetricKey]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ошибки проверки конфигурации
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Некорректный хост: '{0}'")]
    InvalidHost(String),

    #[error("Порт не может быть 0")]
    InvalidPort,

    #[error("Для SNMPv2c нужна непустая community")]
    MissingCommunity,

    #[error("Для SNMPv3 нужно имя пользователя")]
    MissingUsername,

    #[error("Не задан пароль аутентификации для {0}")]
    MissingAuthSecret(String),

    #[error("Шифрование {0} невозможно без аутентификации")]
    PrivacyWithoutAuth(String),

    #[error("Не задан пароль шифрования для {0}")]
    MissingPrivacySecret(String),

    #[error("Протокол {0} не поддерживается")]
    UnsupportedProtocol(String),

    #[error("Интервал опроса {0}с вне диапазона [{1}, {2}]")]
    PollIntervalOutOfRange(u64, u64, u64),

    #[error("Невалидный OID: {0}")]
    InvalidOid(String),

    #[error("Неизвестная метрика: {0}")]
    UnknownMetric(String),

    #[error("Метрика {0} указана дважды")]
    DuplicateMetric(String),

    #[error("Устройство '{0}' описано дважды")]
    DuplicateDevice(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            Failure::Timeout(Duration::from_secs(5)).kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            Failure::AuthenticationFailed("bad".into()).kind(),
            FailureKind::AuthenticationFailed
        );
        assert_eq!(
            Failure::ExecutionError("closed".into()).kind().as_str(),
            "execution_error"
        );
    }

    #[test]
    fn partial_decode_lists_keys() {
        let failure = Failure::PartialDecode(vec![MetricKey::InputVoltage, MetricKey::OutputPower]);
        assert_eq!(
            failure.to_string(),
            "Не декодированы метрики: input_voltage, output_power"
        );
    }
}
