use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod connection;
pub mod profile;
pub mod settings;

pub use connection::{
    AuthProtocol, ConnectionConfig, Credentials, PrivacyProtocol, SecurityLevel, SnmpVersion,
    V3Credentials,
};
pub use profile::DeviceProfile;
pub use settings::{LogFormat, Settings};

use crate::error::ConfigError;

/// Путь к конфигурации по умолчанию
pub const DEFAULT_CONFIG_PATH: &str = "./config/apc-ups.yaml";

/// Главная конфигурация приложения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Базовые настройки
    #[serde(default)]
    pub settings: Settings,
    /// Опрашиваемые ИБП
    pub devices: Vec<DeviceProfile>,
}

impl AppConfig {
    /// Загружает конфигурацию из YAML файла, применяет переменные окружения
    /// и проверяет результат
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Не удалось прочитать файл: {}", path.display()))?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content).context("Не удалось распарсить YAML")
    }

    /// SNMP_TIMEOUT, SNMP_POLL_INTERVAL и учётные данные устройств
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(timeout) = lookup("SNMP_TIMEOUT").and_then(|s| s.parse().ok()) {
            self.settings.connection.request_timeout = timeout;
        }
        if let Some(interval) = lookup("SNMP_POLL_INTERVAL").and_then(|s| s.parse().ok()) {
            self.settings.polling.interval = interval;
        }
        for device in &mut self.devices {
            device.apply_env(&lookup);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        settings::poll_interval(self.settings.polling.interval)?;
        for (i, device) in self.devices.iter().enumerate() {
            if self.devices[..i].iter().any(|d| d.name == device.name) {
                return Err(ConfigError::DuplicateDevice(device.name.clone()));
            }
            device.connection(&self.settings.connection)?;
            device.sensors()?;
            device.poll_interval(self.settings.polling.interval)?;
        }
        Ok(())
    }

    pub fn device(&self, name: &str) -> Option<&DeviceProfile> {
        self.devices.iter().find(|d| d.name == name)
    }
}
