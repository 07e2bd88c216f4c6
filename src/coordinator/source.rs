use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::catalog::Catalog;
use crate::collector::{SnmpCollector, Snapshot};
use crate::error::Failure;
use crate::executor::{BlockingExecutor, DeviceSlot, device_slot};
use crate::snmp::Transport;

/// Откуда координатор берёт снимки
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    /// Один раунд опроса
    async fn poll(&self) -> Result<Snapshot, Failure>;
}

/// Опрос через блокирующий SNMP транспорт в общем пуле
pub struct SnmpPollSource<T> {
    executor: BlockingExecutor,
    slot: DeviceSlot<T>,
    catalog: Arc<Catalog>,
    round_timeout: Duration,
}

impl<T: Transport + 'static> SnmpPollSource<T> {
    pub fn new(transport: T, executor: BlockingExecutor, catalog: Catalog, round_timeout: Duration) -> Self {
        Self {
            executor,
            slot: device_slot(transport),
            catalog: Arc::new(catalog),
            round_timeout,
        }
    }
}

#[async_trait]
impl<T: Transport + 'static> PollSource for SnmpPollSource<T> {
    async fn poll(&self) -> Result<Snapshot, Failure> {
        let catalog = Arc::clone(&self.catalog);
        let round_timeout = self.round_timeout;
        self.executor
            .run(&self.slot, round_timeout, move |transport| {
                SnmpCollector::poll(transport, &catalog, round_timeout)
            })
            .await
    }
}
