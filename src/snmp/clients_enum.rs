use super::transport::{Transport, TransportError};
use super::v2c::SnmpClientV2c;
use super::v3::SnmpClientV3;
use super::value::RawValue;
use crate::config::{ConnectionConfig, Credentials};

pub enum SnmpClient {
    V2c(SnmpClientV2c),
    V3(SnmpClientV3),
}

impl SnmpClient {
    /// Выбирает версию по учётным данным. Сеть не трогает,
    /// сессия откроется при первом `connect`.
    pub fn new(config: &ConnectionConfig) -> Self {
        let target = config.target();
        match config.credentials() {
            Credentials::V2c { community } => SnmpClient::V2c(SnmpClientV2c::new(
                &target,
                community.as_bytes(),
                config.request_timeout(),
            )),
            Credentials::V3(creds) => SnmpClient::V3(SnmpClientV3::new(
                &target,
                creds.clone(),
                config.request_timeout(),
            )),
        }
    }

    pub fn target(&self) -> &str {
        match self {
            SnmpClient::V2c(client) => client.target(),
            SnmpClient::V3(client) => client.target(),
        }
    }
}

impl Transport for SnmpClient {
    fn connect(&mut self) -> Result<(), TransportError> {
        match self {
            SnmpClient::V2c(client) => client.connect(),
            SnmpClient::V3(client) => client.connect(),
        }
    }

    fn get(&mut self, oid: &str) -> Result<RawValue, TransportError> {
        match self {
            SnmpClient::V2c(client) => client.get(oid),
            SnmpClient::V3(client) => client.get(oid),
        }
    }

    fn get_many(&mut self, oids: &[&str]) -> Result<Vec<RawValue>, TransportError> {
        match self {
            SnmpClient::V2c(client) => client.get_many(oids),
            SnmpClient::V3(client) => client.get_many(oids),
        }
    }

    fn invalidate(&mut self) {
        match self {
            SnmpClient::V2c(client) => client.invalidate(),
            SnmpClient::V3(client) => client.invalidate(),
        }
    }
}
