use std::path::Path;
use std::time::Duration;

use apc_ups_snmp::catalog::MetricKey;
use apc_ups_snmp::config::{
    AppConfig, AuthProtocol, ConnectionConfig, PrivacyProtocol, SecurityLevel, SnmpVersion,
    V3Credentials,
};
use apc_ups_snmp::error::ConfigError;

#[test]
fn shipped_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/apc-ups.yaml");
    let content = std::fs::read_to_string(path).unwrap();
    let config = AppConfig::from_yaml(&content).unwrap();
    config.validate().unwrap();

    assert_eq!(config.devices.len(), 2);
    assert_eq!(
        config.settings.http.as_ref().map(|h| h.listen.as_str()),
        Some("127.0.0.1:8080")
    );

    let room = config.device("server-room").unwrap();
    assert_eq!(room.sensors().unwrap().len(), 6);
    assert!(room.sensors().unwrap().contains(&MetricKey::OutputStatus));

    let rack = config.device("rack-b").unwrap();
    let conn = rack.connection(&config.settings.connection).unwrap();
    assert_eq!(conn.version(), SnmpVersion::V3);
    assert_eq!(rack.poll_interval(config.settings.polling.interval), Ok(Duration::from_secs(30)));
}

#[test]
fn privacy_requires_authentication() {
    let creds = V3Credentials::new("monitor").with_privacy(PrivacyProtocol::Aes, "privpass123");
    assert_eq!(
        ConnectionConfig::v3("192.168.0.72", 161, creds).unwrap_err(),
        ConfigError::PrivacyWithoutAuth("AES".into())
    );

    let creds = V3Credentials::new("monitor")
        .with_auth(AuthProtocol::Sha256, "authpass123")
        .with_privacy(PrivacyProtocol::Aes, "privpass123");
    assert_eq!(creds.security_level(), SecurityLevel::AuthPriv);
    assert!(ConnectionConfig::v3("192.168.0.72", 161, creds).is_ok());
}
