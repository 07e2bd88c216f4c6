pub mod app;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod handlers;
pub mod projection;
pub mod routes;
pub mod setup;
pub mod snmp;

pub use catalog::{Catalog, MetricKey};
pub use collector::{Measurement, Snapshot};
pub use config::ConnectionConfig;
pub use coordinator::{Coordinator, CoordinatorState, HealthStatus};
pub use error::{ConfigError, Failure, FailureKind};
