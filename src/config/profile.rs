use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::connection::{
    AuthProtocol, ConnectionConfig, DEFAULT_COMMUNITY, DEFAULT_PORT, PrivacyProtocol, SnmpVersion,
    V3Credentials,
};
use super::settings::{self, ConnectionSettings};
use crate::catalog::{DEFAULT_SENSORS, MetricKey};
use crate::error::ConfigError;

/// Профиль одного ИБП в файле конфигурации
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Имя устройства, используется в логах и в HTTP API
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub version: SnmpVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub auth_protocol: AuthProtocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
    #[serde(default)]
    pub privacy_protocol: PrivacyProtocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_password: Option<String>,
    /// Публикуемые сенсоры, по умолчанию DEFAULT_SENSORS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensors: Option<Vec<MetricKey>>,
    /// Интервал опроса (секунды), по умолчанию из settings.polling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl DeviceProfile {
    pub fn v2c(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            port: DEFAULT_PORT,
            version: SnmpVersion::V2c,
            community: None,
            username: None,
            auth_protocol: AuthProtocol::None,
            auth_password: None,
            privacy_protocol: PrivacyProtocol::None,
            privacy_password: None,
            sensors: None,
            poll_interval: None,
        }
    }

    /// Собирает проверенные параметры подключения
    pub fn connection(&self, settings: &ConnectionSettings) -> Result<ConnectionConfig, ConfigError> {
        let config = match self.version {
            SnmpVersion::V2c => {
                let community = self.community.as_deref().unwrap_or(DEFAULT_COMMUNITY);
                ConnectionConfig::v2c(&self.host, self.port, community)?
            }
            SnmpVersion::V3 => {
                let creds = V3Credentials::new(self.username.clone().unwrap_or_default())
                    .with_auth(
                        self.auth_protocol,
                        self.auth_password.clone().unwrap_or_default(),
                    )
                    .with_privacy(
                        self.privacy_protocol,
                        self.privacy_password.clone().unwrap_or_default(),
                    );
                ConnectionConfig::v3(&self.host, self.port, creds)?
            }
        };
        Ok(config.with_request_timeout(settings.request_timeout()))
    }

    /// Выбранные сенсоры без повторов
    pub fn sensors(&self) -> Result<Vec<MetricKey>, ConfigError> {
        let Some(sensors) = &self.sensors else {
            return Ok(DEFAULT_SENSORS.to_vec());
        };
        for (i, key) in sensors.iter().enumerate() {
            if sensors[..i].contains(key) {
                return Err(ConfigError::DuplicateMetric(key.to_string()));
            }
        }
        Ok(sensors.clone())
    }

    pub fn poll_interval(&self, default: u64) -> Result<Duration, ConfigError> {
        settings::poll_interval(self.poll_interval.unwrap_or(default))
    }

    /// Заполняет пустые учётные данные из переменных окружения
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fill(&mut self.community, || lookup("SNMP_COMMUNITY"));
        fill(&mut self.username, || lookup("SNMP_USERNAME"));
        fill(&mut self.auth_password, || lookup("SNMP_AUTH_PASSWORD"));
        fill(&mut self.privacy_password, || lookup("SNMP_PRIVACY_PASSWORD"));
    }
}

fn fill(slot: &mut Option<String>, value: impl FnOnce() -> Option<String>) {
    if slot.as_deref().is_none_or(str::is_empty) {
        if let Some(value) = value().filter(|v| !v.is_empty()) {
            *slot = Some(value);
        }
    }
}

fn secret(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "***")
}

impl fmt::Debug for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceProfile")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("version", &self.version)
            .field("community", &secret(&self.community))
            .field("username", &self.username)
            .field("auth_protocol", &self.auth_protocol)
            .field("auth_password", &secret(&self.auth_password))
            .field("privacy_protocol", &self.privacy_protocol)
            .field("privacy_password", &secret(&self.privacy_password))
            .field("sensors", &self.sensors)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::Credentials;

    #[test]
    fn v2c_defaults_to_public() {
        let profile = DeviceProfile::v2c("ups", "192.168.0.71");
        let config = profile.connection(&ConnectionSettings::default()).unwrap();
        assert_eq!(
            config.credentials(),
            &Credentials::V2c {
                community: "public".into()
            }
        );
        assert_eq!(profile.sensors().unwrap(), DEFAULT_SENSORS.to_vec());
    }

    #[test]
    fn env_fills_only_empty_fields() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SNMP_COMMUNITY", "from-env"),
            ("SNMP_USERNAME", "env-user"),
        ]);
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let mut profile = DeviceProfile::v2c("ups", "10.0.0.5");
        profile.username = Some("admin".into());
        profile.apply_env(lookup);
        assert_eq!(profile.community.as_deref(), Some("from-env"));
        assert_eq!(profile.username.as_deref(), Some("admin"));
        assert_eq!(profile.auth_password, None);
    }

    #[test]
    fn duplicate_sensor_is_rejected() {
        let mut profile = DeviceProfile::v2c("ups", "10.0.0.5");
        profile.sensors = Some(vec![MetricKey::OutputLoad, MetricKey::OutputLoad]);
        assert_eq!(
            profile.sensors(),
            Err(ConfigError::DuplicateMetric("output_load".into()))
        );
    }

    #[test]
    fn v3_profile_validates_credentials() {
        let mut profile = DeviceProfile::v2c("ups", "10.0.0.5");
        profile.version = SnmpVersion::V3;
        profile.username = Some("admin".into());
        profile.privacy_protocol = PrivacyProtocol::Aes;
        profile.privacy_password = Some("privpass123".into());
        assert_eq!(
            profile.connection(&ConnectionSettings::default()),
            Err(ConfigError::PrivacyWithoutAuth("AES".into()))
        );
    }

    #[test]
    fn interval_falls_back_to_default() {
        let mut profile = DeviceProfile::v2c("ups", "10.0.0.5");
        assert_eq!(profile.poll_interval(60), Ok(Duration::from_secs(60)));
        profile.poll_interval = Some(5);
        assert!(profile.poll_interval(60).is_err());
    }
}
