use std::time::Duration;

use snmp2::v3::AuthErrorKind;
use snmp2::{Oid, SyncSession, v3};
use tracing::{debug, info};

use super::transport::{
    Transport, TransportError, classify, open_failure, parse_oids, response_values, send, single,
};
use super::value::RawValue;
use crate::config::{AuthProtocol, PrivacyProtocol, V3Credentials};
use crate::error::Failure;

/// Клиент SNMPv3 (USM). Сессия открывается лениво и хранит состояние
/// discovery (engine id, boots, time) между раундами.
///
/// Для пар auth/priv, где ключа шифрования не хватает для AES-192/256,
/// ключ расширяется по Blumenthal. Если первый запрос новой сессии не
/// расшифрован агентом, пробуется Reeder, и удачный способ запоминается.
pub struct SnmpClientV3 {
    target: String,
    credentials: V3Credentials,
    timeout: Duration,
    key_extension: v3::KeyExtension,
    session: Option<SyncSession>,
    /// Сессия уже получила ответ на запрос
    confirmed: bool,
}

impl SnmpClientV3 {
    pub fn new(target: &str, credentials: V3Credentials, timeout: Duration) -> Self {
        Self {
            target: target.to_string(),
            credentials,
            timeout,
            key_extension: v3::KeyExtension::Blumenthal,
            session: None,
            confirmed: false,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn open(&self) -> Result<SyncSession, TransportError> {
        let security = security(&self.credentials, self.key_extension)?;
        let mut session = SyncSession::new_v3(self.target.as_str(), Some(self.timeout), 0, security)
            .map_err(|e| open_failure(e, &self.target))?;

        debug!(target_addr = %self.target, user = %self.credentials.username, "SNMPv3 discovery");
        session.init().map_err(|e| classify(e, self.timeout))?;
        Ok(session)
    }

    fn session(&mut self) -> Result<&mut SyncSession, TransportError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.open()?,
        };
        Ok(self.session.insert(session))
    }
}

impl Transport for SnmpClientV3 {
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
        let confirmed = self.confirmed;
        let session = self.session()?;

        let mut result = request(session, &refs);
        let mut switched = None;
        if !confirmed && undecrypted(&result) {
            match session.try_another_key_extension_method() {
                Ok(Some(method)) => {
                    debug!(?method, "Повтор с другим расширением ключа");
                    switched = Some(method);
                    result = request(session, &refs);
                }
                Ok(None) => {}
                Err(e) => result = Err(e),
            }
        }

        let values = result.map_err(|e| classify(e, timeout))?;
        if let Some(method) = switched {
            info!(target_addr = %self.target, ?method, "Агент использует другое расширение ключа");
            self.key_extension = method;
        }
        self.confirmed = true;
        values
    }

    fn invalidate(&mut self) {
        self.session = None;
        self.confirmed = false;
    }
}

fn request(
    session: &mut SyncSession,
    oids: &[&Oid<'_>],
) -> Result<Result<Vec<RawValue>, TransportError>, snmp2::Error> {
    send(|| session.get_many(oids).map(|pdu| response_values(pdu, oids.len())))
}

/// Агент не смог расшифровать запрос: отвечает report или молчит
fn undecrypted<T>(result: &Result<T, snmp2::Error>) -> bool {
    matches!(
        result,
        Err(snmp2::Error::AuthFailure(AuthErrorKind::NotAuthenticated) | snmp2::Error::Receive)
    )
}

/// Способ расширения ключа, если пара auth/priv его требует
fn key_extension(
    protocol: v3::AuthProtocol,
    cipher: &v3::Cipher,
    method: v3::KeyExtension,
) -> Option<v3::KeyExtension> {
    cipher.priv_key_needs_extension(&protocol).then_some(method)
}

fn security(creds: &V3Credentials, method: v3::KeyExtension) -> Result<v3::Security, Failure> {
    let security = v3::Security::new(creds.username.as_bytes(), creds.auth_secret.as_bytes());

    let Some(protocol) = auth_protocol(creds.auth_protocol) else {
        return Ok(security.with_auth(v3::Auth::NoAuthNoPriv));
    };
    let security = security.with_auth_protocol(protocol);

    let Some(cipher) = cipher(creds.privacy_protocol)? else {
        return Ok(security.with_auth(v3::Auth::AuthNoPriv));
    };
    let security = match key_extension(protocol, &cipher, method) {
        Some(method) => security.with_key_extension_method(method),
        None => security,
    };
    Ok(security.with_auth(v3::Auth::AuthPriv {
        cipher,
        privacy_password: creds.privacy_secret.as_bytes().to_vec(),
    }))
}

fn auth_protocol(protocol: AuthProtocol) -> Option<v3::AuthProtocol> {
    match protocol {
        AuthProtocol::None => None,
        AuthProtocol::Md5 => Some(v3::AuthProtocol::Md5),
        AuthProtocol::Sha => Some(v3::AuthProtocol::Sha1),
        AuthProtocol::Sha224 => Some(v3::AuthProtocol::Sha224),
        AuthProtocol::Sha256 => Some(v3::AuthProtocol::Sha256),
        AuthProtocol::Sha384 => Some(v3::AuthProtocol::Sha384),
        AuthProtocol::Sha512 => Some(v3::AuthProtocol::Sha512),
    }
}

fn cipher(protocol: PrivacyProtocol) -> Result<Option<v3::Cipher>, Failure> {
    match protocol {
        PrivacyProtocol::None => Ok(None),
        PrivacyProtocol::Des => Ok(Some(v3::Cipher::Des)),
        PrivacyProtocol::Aes => Ok(Some(v3::Cipher::Aes128)),
        PrivacyProtocol::Aes192 => Ok(Some(v3::Cipher::Aes192)),
        PrivacyProtocol::Aes256 => Ok(Some(v3::Cipher::Aes256)),
        // отсекается при проверке ConnectionConfig
        PrivacyProtocol::TripleDes => Err(Failure::ProtocolError(
            "3DES не поддерживается сессией".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha_maps_to_sha1() {
        assert!(matches!(
            auth_protocol(AuthProtocol::Sha),
            Some(v3::AuthProtocol::Sha1)
        ));
        assert!(auth_protocol(AuthProtocol::None).is_none());
    }

    #[test]
    fn short_keys_are_extended() {
        let blumenthal = v3::KeyExtension::Blumenthal;
        assert_eq!(
            key_extension(v3::AuthProtocol::Sha1, &v3::Cipher::Aes256, blumenthal),
            Some(blumenthal)
        );
        assert_eq!(
            key_extension(v3::AuthProtocol::Md5, &v3::Cipher::Aes192, v3::KeyExtension::Reeder),
            Some(v3::KeyExtension::Reeder)
        );
        assert_eq!(key_extension(v3::AuthProtocol::Sha256, &v3::Cipher::Aes256, blumenthal), None);
        assert_eq!(key_extension(v3::AuthProtocol::Sha1, &v3::Cipher::Aes128, blumenthal), None);

        let creds = V3Credentials::new("admin")
            .with_auth(AuthProtocol::Sha, "authpass123")
            .with_privacy(PrivacyProtocol::Aes256, "privpass123");
        let security = security(&creds, blumenthal).unwrap();
        assert!(format!("{security:?}").contains("key_extension_method: Some(Blumenthal)"));
    }

    #[test]
    fn unanswered_first_request_tries_other_extension() {
        let report: Result<(), _> = Err(snmp2::Error::AuthFailure(AuthErrorKind::NotAuthenticated));
        assert!(undecrypted(&report));
        assert!(undecrypted::<()>(&Err(snmp2::Error::Receive)));
        assert!(!undecrypted::<()>(&Err(snmp2::Error::AuthFailure(
            AuthErrorKind::SignatureMismatch
        ))));
        assert!(!undecrypted(&Ok(())));
    }

    #[test]
    fn triple_des_never_downgrades() {
        assert!(cipher(PrivacyProtocol::TripleDes).is_err());
        assert!(matches!(cipher(PrivacyProtocol::Aes), Ok(Some(v3::Cipher::Aes128))));
    }
}
