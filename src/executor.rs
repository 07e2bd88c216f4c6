//! Пул для блокирующих SNMP сессий

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;
use tracing::debug;

use crate::error::Failure;

/// Число потоков по умолчанию: один опрос это один запрос в полёте
pub const DEFAULT_WORKERS: usize = 4;

/// Слот устройства. Через него проходят все вызовы одной сессии,
/// поэтому v3 состояние одного устройства не перемешивается.
pub type DeviceSlot<T> = Arc<Mutex<T>>;

pub fn device_slot<T>(value: T) -> DeviceSlot<T> {
    Arc::new(Mutex::new(value))
}

/// Ограниченный пул поверх `spawn_blocking`
#[derive(Debug, Clone)]
pub struct BlockingExecutor {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl Default for BlockingExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl BlockingExecutor {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Выполняет `job` в блокирующем потоке с эксклюзивным доступом к слоту.
    ///
    /// `deadline` ограничивает отдельно ожидание слота и потока пула и
    /// саму задачу. Не дождались слота: предыдущий опрос устройства ещё
    /// идёт, это `Timeout`. Не дождались потока: пул занят другими
    /// устройствами, это `ExecutionError`.
    ///
    /// Если задача не уложилась в `deadline`, результат отбрасывается, а
    /// сама задача дорабатывает до конца и держит слот: SNMP запрос нельзя
    /// безопасно прервать на середине.
    pub async fn run<S, R, F>(&self, slot: &DeviceSlot<S>, deadline: Duration, job: F) -> Result<R, Failure>
    where
        S: Send + 'static,
        R: Send + 'static,
        F: FnOnce(&mut S) -> Result<R, Failure> + Send + 'static,
    {
        if self.permits.is_closed() {
            return Err(shutdown());
        }

        let Ok(guard) = timeout(deadline, Arc::clone(slot).lock_owned()).await else {
            debug!(deadline_secs = deadline.as_secs_f32(), "предыдущий опрос устройства ещё не завершён");
            return Err(Failure::Timeout(deadline));
        };

        let permit = match timeout(deadline, Arc::clone(&self.permits).acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(shutdown()),
            Err(_) => {
                return Err(Failure::ExecutionError(format!(
                    "все {} потоков пула заняты",
                    self.workers
                )));
            }
        };

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut guard = guard;
            job(&mut guard)
        });

        match timeout(deadline, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(Failure::ExecutionError(format!("задача опроса упала: {e}"))),
            Err(_) => {
                debug!(deadline_secs = deadline.as_secs_f32(), "результат опроса отброшен по таймауту");
                Err(Failure::Timeout(deadline))
            }
        }
    }

    /// Новые задачи больше не принимаются, текущие дорабатывают
    pub fn shutdown(&self) {
        self.permits.close();
    }
}

fn shutdown() -> Failure {
    Failure::ExecutionError("пул исполнителей остановлен".into())
}
