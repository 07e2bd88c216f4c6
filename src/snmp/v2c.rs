use std::time::Duration;

use snmp2::{Oid, SyncSession};

use super::transport::{
    Transport, TransportError, classify, open_failure, parse_oids, response_values, send, single,
};
use super::value::RawValue;

pub struct SnmpClientV2c {
    target: String,
    community: Vec<u8>,
    timeout: Duration,
    session: Option<SyncSession>,
}

impl SnmpClientV2c {
    pub fn new(target: &str, community: &[u8], timeout: Duration) -> Self {
        Self {
            target: target.to_string(),
            community: community.to_vec(),
            timeout,
            session: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn session(&mut self) -> Result<&mut SyncSession, TransportError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => SyncSession::new_v2c(
                self.target.as_str(),
                &self.community,
                Some(self.timeout),
                0,
            )
            .map_err(|e| open_failure(e, &self.target))?,
        };
        Ok(self.session.insert(session))
    }
}

impl Transport for SnmpClientV2c {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.session().map(|_| ())
    }

    fn get(&mut self, oid: &str) -> Result<RawValue, TransportError> {
        single(self.get_many(&[oid])?)
    }

    fn get_many(&mut self, oids: &[&str]) -> Result<Vec<RawValue>, TransportError> {
        let oids = parse_oids(oids)?;
        let refs: Vec<&Oid<'_>> = oids.iter().collect();
        let timeout = self.timeout;
        let session = self.session()?;
        send(|| session.get_many(&refs).map(|pdu| response_values(pdu, refs.len())))
            .map_err(|e| classify(e, timeout))?
    }

    fn invalidate(&mut self) {
        self.session = None;
    }
}
