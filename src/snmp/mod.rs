//! SNMP клиенты v2c/v3 поверх блокирующей `snmp2::SyncSession`

pub mod clients_enum;
pub mod oid;
pub mod transport;
pub mod v2c;
pub mod v3;
pub mod value;

pub use clients_enum::SnmpClient;
pub use oid::parse_oid;
pub use transport::{Transport, TransportError};
pub use v2c::SnmpClientV2c;
pub use v3::SnmpClientV3;
pub use value::RawValue;
