//! Координатор опроса одного ИБП: таймер, кэш последнего снимка,
//! учёт ошибок и рассылка подписчикам.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod listeners;
pub mod source;
pub mod state;

pub use listeners::{Listener, Subscription};
pub use source::{PollSource, SnmpPollSource};
pub use state::{CoordinatorState, HealthStatus, Phase};

use crate::collector::Snapshot;
use crate::config::settings;
use crate::error::{ConfigError, Failure};
use listeners::Listeners;

/// Хэндл координатора, клонируется дёшево
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    device: String,
    source: Box<dyn PollSource>,
    state: watch::Sender<CoordinatorState>,
    listeners: Listeners,
    interval_secs: AtomicU64,
    cancel: CancellationToken,
    /// Опросы одного устройства строго последовательны
    poll_gate: tokio::sync::Mutex<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(
        device: impl Into<String>,
        source: impl PollSource,
        interval: Duration,
    ) -> Result<Self, ConfigError> {
        let interval = settings::poll_interval(interval.as_secs())?;
        let (state, _) = watch::channel(CoordinatorState::default());
        Ok(Self {
            inner: Arc::new(Inner {
                device: device.into(),
                source: Box::new(source),
                state,
                listeners: Listeners::default(),
                interval_secs: AtomicU64::new(interval.as_secs()),
                cancel: CancellationToken::new(),
                poll_gate: tokio::sync::Mutex::new(()),
                task: Mutex::new(None),
            }),
        })
    }

    pub fn device(&self) -> &str {
        &self.inner.device
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CoordinatorState) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.listeners.add(Arc::new(listener))
    }

    /// `false`, если подписка уже снята
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.inner.listeners.remove(subscription)
    }

    pub fn subscribers(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Канал состояний для асинхронных потребителей
    pub fn watch(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state.subscribe()
    }

    /// Копия текущего состояния, без ожидания
    pub fn current_state(&self) -> CoordinatorState {
        self.inner.state.borrow().clone()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.inner.interval_secs.load(Ordering::Relaxed))
    }

    /// Новый интервал применяется при следующем планировании
    pub fn set_poll_interval(&self, seconds: u64) -> Result<(), ConfigError> {
        settings::poll_interval(seconds)?;
        self.inner.interval_secs.store(seconds, Ordering::Relaxed);
        debug!(device = %self.inner.device, interval_secs = seconds, "Интервал опроса изменён");
        Ok(())
    }

    /// Запускает цикл опроса. Первый опрос сразу.
    /// `false`, если цикл уже запущен или координатор остановлен.
    pub fn start(&self) -> bool {
        let mut task = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() || self.inner.cancel.is_cancelled() {
            return false;
        }
        let this = self.clone();
        *task = Some(tokio::spawn(async move { this.run().await }));
        info!(
            device = %self.inner.device,
            interval_secs = self.poll_interval().as_secs(),
            "Координатор запущен"
        );
        true
    }

    /// Останавливает таймер. Результат опроса в полёте отбрасывается.
    /// Повторный вызов ничего не делает.
    pub fn stop(&self) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        self.inner.cancel.cancel();
        self.inner.state.send_modify(|state| {
            state.phase = Phase::Stopped;
            state.next_poll = None;
        });
        info!(device = %self.inner.device, "Координатор остановлен");
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Дожидается завершения цикла опроса
    pub async fn join(&self) {
        let handle = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Внеочередной опрос, последовательно с таймерными
    pub async fn refresh(&self) -> CoordinatorState {
        self.poll_once().await
    }

    async fn run(self) {
        let cancel = self.inner.cancel.clone();
        let mut next = Instant::now();

        loop {
            self.inner.state.send_if_modified(|state| {
                if state.phase == Phase::Stopped {
                    return false;
                }
                state.next_poll = Some(next);
                true
            });

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = sleep_until(next) => {}
            }

            let started = Instant::now();
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = self.poll_once() => {}
            }

            // тики, пропущенные за время медленного опроса, не копятся
            let interval = self.poll_interval();
            next = started + interval;
            let now = Instant::now();
            if next <= now {
                let behind = now.duration_since(next);
                let skipped = behind.as_secs() / interval.as_secs().max(1) + 1;
                next += interval * u32::try_from(skipped).unwrap_or(u32::MAX);
                debug!(device = %self.inner.device, skipped, "Опрос дольше интервала, тики пропущены");
            }
        }

        debug!(device = %self.inner.device, "Цикл опроса завершён");
    }

    async fn poll_once(&self) -> CoordinatorState {
        let _gate = self.inner.poll_gate.lock().await;
        if self.inner.cancel.is_cancelled() {
            return self.current_state();
        }

        self.inner.state.send_if_modified(|state| {
            let polling = state.phase != Phase::Stopped;
            if polling {
                state.phase = Phase::Polling;
            }
            polling
        });

        let result = self.inner.source.poll().await;
        if !self.apply(result) {
            debug!(device = %self.inner.device, "Координатор остановлен, результат отброшен");
            return self.current_state();
        }

        let state = self.current_state();
        self.inner.listeners.notify(&self.inner.device, &state);
        state
    }

    /// Записывает результат опроса. `false`, если координатор уже остановлен.
    fn apply(&self, result: Result<Snapshot, Failure>) -> bool {
        let device = self.inner.device.as_str();
        self.inner.state.send_if_modified(|state| {
            if state.phase == Phase::Stopped {
                return false;
            }
            match result {
                Ok(snapshot) => {
                    if state.consecutive_failures > 0 {
                        info!(device, failures = state.consecutive_failures, "Связь с ИБП восстановлена");
                    }
                    if let Some(partial) = snapshot.partial_decode() {
                        debug!(device, %partial, "Снимок неполный");
                    }
                    state.record_success(snapshot);
                }
                Err(failure) => {
                    let kind = failure.kind();
                    state.record_failure(failure);
                    let failures = state.consecutive_failures;
                    let error = state.last_error.as_ref().map(ToString::to_string).unwrap_or_default();
                    if failures == 1 {
                        warn!(device, %kind, failures, %error, "Опрос ИБП не удался");
                    } else {
                        debug!(device, %kind, failures, %error, "Опрос ИБП снова не удался");
                    }
                }
            }
            true
        })
    }
}
