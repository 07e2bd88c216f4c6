use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, warn};

use super::state::CoordinatorState;

/// Подписчик на обновления. Ошибка или паника подписчика логируется
/// и не мешает остальным.
pub type Listener = dyn Fn(&CoordinatorState) -> anyhow::Result<()> + Send + Sync;

/// Хэндл подписки для `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

#[derive(Default)]
pub(crate) struct Listeners {
    inner: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(Subscription, Arc<Listener>)>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Arc<Listener>) -> Subscription {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        registry.next_id += 1;
        let subscription = Subscription(registry.next_id);
        registry.entries.push((subscription, listener));
        subscription
    }

    pub(crate) fn remove(&self, subscription: Subscription) -> bool {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.entries.len();
        registry.entries.retain(|(s, _)| *s != subscription);
        registry.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Вызывает всех подписчиков вне блокировки реестра,
    /// так что подписчик может отписаться из своего же вызова
    pub(crate) fn notify(&self, device: &str, state: &CoordinatorState) {
        let listeners: Vec<_> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(s, l)| (*s, Arc::clone(l)))
            .collect();

        for (subscription, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(state))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(device, subscription = subscription.0, error = %e, "Ошибка подписчика");
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "без сообщения".to_string());
                    error!(device, subscription = subscription.0, panic = %message, "Подписчик запаниковал");
                }
            }
        }
    }
}
