use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 161;
pub const DEFAULT_COMMUNITY: &str = "public";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Версия протокола SNMP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnmpVersion {
    #[default]
    V2c,
    V3,
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnmpVersion::V2c => "SNMPv2c",
            SnmpVersion::V3 => "SNMPv3",
        })
    }
}

/// Протокол аутентификации SNMPv3 (USM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AuthProtocol {
    #[default]
    #[serde(rename = "none", alias = "NONE")]
    None,
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA")]
    Sha,
    #[serde(rename = "SHA224")]
    Sha224,
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA384")]
    Sha384,
    #[serde(rename = "SHA512")]
    Sha512,
}

impl AuthProtocol {
    pub const ALL: &'static [AuthProtocol] = &[
        AuthProtocol::None,
        AuthProtocol::Md5,
        AuthProtocol::Sha,
        AuthProtocol::Sha224,
        AuthProtocol::Sha256,
        AuthProtocol::Sha384,
        AuthProtocol::Sha512,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            AuthProtocol::None => "none",
            AuthProtocol::Md5 => "MD5",
            AuthProtocol::Sha => "SHA",
            AuthProtocol::Sha224 => "SHA224",
            AuthProtocol::Sha256 => "SHA256",
            AuthProtocol::Sha384 => "SHA384",
            AuthProtocol::Sha512 => "SHA512",
        }
    }

    pub fn is_none(self) -> bool {
        self == AuthProtocol::None
    }
}

impl FromStr for AuthProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuthProtocol::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnsupportedProtocol(s.to_string()))
    }
}

impl fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Протокол шифрования SNMPv3 (USM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrivacyProtocol {
    #[default]
    #[serde(rename = "none", alias = "NONE")]
    None,
    #[serde(rename = "DES")]
    Des,
    /// Принимается в конфигурации, но сессией не поддерживается
    #[serde(rename = "3DES")]
    TripleDes,
    #[serde(rename = "AES")]
    Aes,
    #[serde(rename = "AES192")]
    Aes192,
    #[serde(rename = "AES256")]
    Aes256,
}

impl PrivacyProtocol {
    pub const ALL: &'static [PrivacyProtocol] = &[
        PrivacyProtocol::None,
        PrivacyProtocol::Des,
        PrivacyProtocol::TripleDes,
        PrivacyProtocol::Aes,
        PrivacyProtocol::Aes192,
        PrivacyProtocol::Aes256,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PrivacyProtocol::None => "none",
            PrivacyProtocol::Des => "DES",
            PrivacyProtocol::TripleDes => "3DES",
            PrivacyProtocol::Aes => "AES",
            PrivacyProtocol::Aes192 => "AES192",
            PrivacyProtocol::Aes256 => "AES256",
        }
    }

    pub fn is_none(self) -> bool {
        self == PrivacyProtocol::None
    }
}

impl FromStr for PrivacyProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrivacyProtocol::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnsupportedProtocol(s.to_string()))
    }
}

impl fmt::Display for PrivacyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Уровень безопасности USM, выводится из протоколов
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

/// Учётные данные пользователя SNMPv3
#[derive(Clone, PartialEq, Eq)]
pub struct V3Credentials {
    pub username: String,
    pub auth_protocol: AuthProtocol,
    pub auth_secret: String,
    pub privacy_protocol: PrivacyProtocol,
    pub privacy_secret: String,
}

impl V3Credentials {
    /// noAuthNoPriv
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            auth_protocol: AuthProtocol::None,
            auth_secret: String::new(),
            privacy_protocol: PrivacyProtocol::None,
            privacy_secret: String::new(),
        }
    }

    pub fn with_auth(mut self, protocol: AuthProtocol, secret: impl Into<String>) -> Self {
        self.auth_protocol = protocol;
        self.auth_secret = secret.into();
        self
    }

    pub fn with_privacy(mut self, protocol: PrivacyProtocol, secret: impl Into<String>) -> Self {
        self.privacy_protocol = protocol;
        self.privacy_secret = secret.into();
        self
    }

    pub fn security_level(&self) -> SecurityLevel {
        match (self.auth_protocol.is_none(), self.privacy_protocol.is_none()) {
            (true, _) => SecurityLevel::NoAuthNoPriv,
            (false, true) => SecurityLevel::AuthNoPriv,
            (false, false) => SecurityLevel::AuthPriv,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        if !self.auth_protocol.is_none() && self.auth_secret.is_empty() {
            return Err(ConfigError::MissingAuthSecret(self.auth_protocol.to_string()));
        }
        if !self.privacy_protocol.is_none() {
            // privacy без authentication запрещено самим USM
            if self.auth_protocol.is_none() {
                return Err(ConfigError::PrivacyWithoutAuth(self.privacy_protocol.to_string()));
            }
            if self.privacy_secret.is_empty() {
                return Err(ConfigError::MissingPrivacySecret(self.privacy_protocol.to_string()));
            }
            if self.privacy_protocol == PrivacyProtocol::TripleDes {
                return Err(ConfigError::UnsupportedProtocol(self.privacy_protocol.to_string()));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for V3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("V3Credentials")
            .field("username", &self.username)
            .field("auth_protocol", &self.auth_protocol)
            .field("auth_secret", &redact(&self.auth_secret))
            .field("privacy_protocol", &self.privacy_protocol)
            .field("privacy_secret", &redact(&self.privacy_secret))
            .finish()
    }
}

/// Учётные данные, зависящие от версии
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    V2c { community: String },
    V3(V3Credentials),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::V2c { community } => f
                .debug_struct("V2c")
                .field("community", &redact(community))
                .finish(),
            Credentials::V3(creds) => f.debug_tuple("V3").field(creds).finish(),
        }
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<empty>" } else { "***" }
}

/// Неизменяемые параметры подключения к одному устройству.
/// Инварианты проверяются при создании, поэтому любой существующий
/// `ConnectionConfig` валиден.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    credentials: Credentials,
    request_timeout: Duration,
}

impl ConnectionConfig {
    pub fn v2c(host: &str, port: u16, community: &str) -> Result<Self, ConfigError> {
        if community.is_empty() {
            return Err(ConfigError::MissingCommunity);
        }
        Self::build(
            host,
            port,
            Credentials::V2c {
                community: community.to_string(),
            },
        )
    }

    pub fn v3(host: &str, port: u16, credentials: V3Credentials) -> Result<Self, ConfigError> {
        credentials.validate()?;
        Self::build(host, port, Credentials::V3(credentials))
    }

    fn build(host: &str, port: u16, credentials: Credentials) -> Result<Self, ConfigError> {
        let host = host.trim();
        if !is_valid_host(host) {
            return Err(ConfigError::InvalidHost(host.to_string()));
        }
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        Ok(Self {
            host: host.to_string(),
            port,
            credentials,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Таймаут одного запроса на сокете
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn version(&self) -> SnmpVersion {
        match self.credentials {
            Credentials::V2c { .. } => SnmpVersion::V2c,
            Credentials::V3(_) => SnmpVersion::V3,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Адрес в виде "host:port" (IPv6 в квадратных скобках)
    pub fn target(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// IP-адрес или имя хоста по RFC 1123
pub fn is_valid_host(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha_aes() -> V3Credentials {
        V3Credentials::new("admin")
            .with_auth(AuthProtocol::Sha, "authpass123")
            .with_privacy(PrivacyProtocol::Aes, "privpass123")
    }

    #[test]
    fn v2c_config() {
        let config = ConnectionConfig::v2c("192.168.1.100", 161, "public").unwrap();
        assert_eq!(config.version(), SnmpVersion::V2c);
        assert_eq!(config.target(), "192.168.1.100:161");
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn v3_auth_priv() {
        let config = ConnectionConfig::v3("ups.local", 1161, sha_aes()).unwrap();
        assert_eq!(config.version(), SnmpVersion::V3);
        match config.credentials() {
            Credentials::V3(creds) => assert_eq!(creds.security_level(), SecurityLevel::AuthPriv),
            other => panic!("ожидались v3, получено {other:?}"),
        }
    }

    #[test]
    fn privacy_without_auth_is_rejected() {
        let creds = V3Credentials::new("admin").with_privacy(PrivacyProtocol::Aes, "privpass123");
        assert_eq!(
            ConnectionConfig::v3("192.168.1.100", 161, creds),
            Err(ConfigError::PrivacyWithoutAuth("AES".into()))
        );
    }

    #[test]
    fn v3_requires_username_and_secrets() {
        assert_eq!(
            ConnectionConfig::v3("10.0.0.1", 161, V3Credentials::new("  ")),
            Err(ConfigError::MissingUsername)
        );
        let creds = V3Credentials::new("admin").with_auth(AuthProtocol::Sha256, "");
        assert_eq!(
            ConnectionConfig::v3("10.0.0.1", 161, creds),
            Err(ConfigError::MissingAuthSecret("SHA256".into()))
        );
        let creds = V3Credentials::new("admin")
            .with_auth(AuthProtocol::Sha, "authpass123")
            .with_privacy(PrivacyProtocol::Aes256, "");
        assert_eq!(
            ConnectionConfig::v3("10.0.0.1", 161, creds),
            Err(ConfigError::MissingPrivacySecret("AES256".into()))
        );
    }

    #[test]
    fn no_auth_no_priv_is_valid() {
        let config = ConnectionConfig::v3("10.0.0.1", 161, V3Credentials::new("monitor")).unwrap();
        match config.credentials() {
            Credentials::V3(creds) => assert_eq!(creds.security_level(), SecurityLevel::NoAuthNoPriv),
            other => panic!("ожидались v3, получено {other:?}"),
        }
    }

    #[test]
    fn triple_des_is_not_supported() {
        let creds = V3Credentials::new("admin")
            .with_auth(AuthProtocol::Sha, "authpass123")
            .with_privacy(PrivacyProtocol::TripleDes, "privpass123");
        assert_eq!(
            ConnectionConfig::v3("10.0.0.1", 161, creds),
            Err(ConfigError::UnsupportedProtocol("3DES".into()))
        );
    }

    #[test]
    fn host_validation() {
        assert!(is_valid_host("192.168.0.71"));
        assert!(is_valid_host("fe80::1"));
        assert!(is_valid_host("ups-1.server-room.example"));
        assert!(!is_valid_host(""));
        assert!(!is_valid_host("-ups"));
        assert!(!is_valid_host("ups..local"));
        assert!(!is_valid_host("ups_1"));
        assert!(!is_valid_host(&"a".repeat(254)));
        assert!(ConnectionConfig::v2c("bad host", 161, "public").is_err());
        assert_eq!(
            ConnectionConfig::v2c("10.0.0.1", 0, "public"),
            Err(ConfigError::InvalidPort)
        );
    }

    #[test]
    fn ipv6_target_is_bracketed() {
        let config = ConnectionConfig::v2c("fe80::1", 161, "public").unwrap();
        assert_eq!(config.target(), "[fe80::1]:161");
    }

    #[test]
    fn debug_hides_secrets() {
        let config = ConnectionConfig::v3("10.0.0.1", 161, sha_aes()).unwrap();
        let text = format!("{config:?}");
        assert!(!text.contains("authpass123"));
        assert!(!text.contains("privpass123"));
        let config = ConnectionConfig::v2c("10.0.0.1", 161, "s3cret").unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn protocol_names_parse() {
        assert_eq!("sha256".parse::<AuthProtocol>(), Ok(AuthProtocol::Sha256));
        assert_eq!("AES".parse::<PrivacyProtocol>(), Ok(PrivacyProtocol::Aes));
        assert!("SHA3".parse::<AuthProtocol>().is_err());
    }
}
