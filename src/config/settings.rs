use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Нижняя граница интервала опроса, секунды
pub const POLL_INTERVAL_MIN: u64 = 10;
/// Верхняя граница интервала опроса, секунды
pub const POLL_INTERVAL_MAX: u64 = 300;

/// Проверяет интервал опроса по границам [10, 300]
pub fn poll_interval(seconds: u64) -> Result<Duration, ConfigError> {
    if (POLL_INTERVAL_MIN..=POLL_INTERVAL_MAX).contains(&seconds) {
        Ok(Duration::from_secs(seconds))
    } else {
        Err(ConfigError::PollIntervalOutOfRange(
            seconds,
            POLL_INTERVAL_MIN,
            POLL_INTERVAL_MAX,
        ))
    }
}

/// Базовые настройки приложения
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Настройки подключения
    pub connection: ConnectionSettings,
    /// Настройки опроса
    pub polling: PollingSettings,
    pub logging: LoggingSettings,
    /// HTTP API, если не задан - не поднимается
    pub http: Option<HttpSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Таймаут одного SNMP запроса (секунды)
    pub request_timeout: u64,
    /// Потолок на весь раунд опроса (секунды)
    pub round_timeout: u64,
    /// Потоков для блокирующих сессий
    pub workers: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            request_timeout: 5,
            round_timeout: 10,
            workers: 4,
        }
    }
}

impl ConnectionSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }

    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.round_timeout.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Интервал опроса по умолчанию (секунды)
    pub interval: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self { interval: 60 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Директива для EnvFilter, RUST_LOG имеет приоритет
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    pub listen: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_bounds() {
        assert_eq!(
            poll_interval(5),
            Err(ConfigError::PollIntervalOutOfRange(5, 10, 300))
        );
        assert!(poll_interval(301).is_err());
        assert_eq!(poll_interval(10), Ok(Duration::from_secs(10)));
        assert_eq!(poll_interval(300), Ok(Duration::from_secs(300)));
    }

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.connection.request_timeout(), Duration::from_secs(5));
        assert_eq!(settings.connection.round_timeout(), Duration::from_secs(10));
        assert_eq!(settings.polling.interval, 60);
        assert!(settings.http.is_none());
    }
}
