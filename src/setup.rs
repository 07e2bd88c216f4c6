//! Проверка подключения перед созданием координатора

use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::collector::{DeviceIdentity, Snapshot};
use crate::config::ConnectionConfig;
use crate::coordinator::{PollSource, SnmpPollSource};
use crate::error::Failure;
use crate::executor::BlockingExecutor;
use crate::snmp::{SnmpClient, Transport};

/// Один полный раунд по реальному клиенту. Ошибка классифицирована так же,
/// как в штатном опросе, и возвращается вызывающему.
pub async fn test_connection(
    config: &ConnectionConfig,
    executor: &BlockingExecutor,
    round_timeout: Duration,
) -> Result<Snapshot, Failure> {
    info!(target_addr = %config.target(), version = %config.version(), "Проверка подключения");
    verify(SnmpClient::new(config), executor, round_timeout).await
}

/// То же для произвольного транспорта
pub async fn verify<T: Transport + 'static>(
    transport: T,
    executor: &BlockingExecutor,
    round_timeout: Duration,
) -> Result<Snapshot, Failure> {
    let source = SnmpPollSource::new(transport, executor.clone(), Catalog::apc().clone(), round_timeout);
    let result = source.poll().await;

    match &result {
        Ok(snapshot) => {
            let identity = DeviceIdentity::from_snapshot(snapshot);
            info!(
                device = %identity.display_name(),
                serial = identity.serial.as_deref().unwrap_or("-"),
                complete = snapshot.is_complete(),
                "Подключение успешно"
            );
        }
        Err(failure) => warn!(kind = %failure.kind(), error = %failure, "Подключение не удалось"),
    }
    result
}
