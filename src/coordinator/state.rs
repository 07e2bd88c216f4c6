use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::collector::Snapshot;
use crate::error::Failure;

/// Фаза координатора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Polling,
    /// Конечная, после `stop()`
    Stopped,
}

/// Что потребитель показывает пользователю.
/// "Ни разу не опрошено", "было хорошо, сейчас ошибки" и "частичные
/// данные" различимы, а не сведены к одному флагу.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Опросов ещё не было
    NeverPolled,
    /// Опросы были, ни одного успешного
    NeverSucceeded,
    Healthy,
    /// Последний опрос успешен, но часть OID не декодирована
    Partial,
    /// Снимок есть, но последние опросы завершились ошибкой
    Failing,
}

impl HealthStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            HealthStatus::NeverPolled => "never_polled",
            HealthStatus::NeverSucceeded => "never_succeeded",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Partial => "partial",
            HealthStatus::Failing => "failing",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Копия состояния координатора. Снимок разделяется через `Arc`
/// и никогда не меняется на месте.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorState {
    pub phase: Phase,
    /// Последний успешный снимок, на ошибке не сбрасывается
    pub snapshot: Option<Arc<Snapshot>>,
    /// Ошибка последнего опроса, очищается при успехе
    pub last_error: Option<Failure>,
    pub consecutive_failures: u32,
    pub next_poll: Option<Instant>,
    pub last_success: Option<DateTime<Utc>>,
    /// Завершённых опросов всего
    pub polls: u64,
}

impl Default for CoordinatorState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            snapshot: None,
            last_error: None,
            consecutive_failures: 0,
            next_poll: None,
            last_success: None,
            polls: 0,
        }
    }
}

impl CoordinatorState {
    pub fn status(&self) -> HealthStatus {
        match (&self.snapshot, &self.last_error) {
            _ if self.polls == 0 => HealthStatus::NeverPolled,
            (None, _) => HealthStatus::NeverSucceeded,
            (Some(_), Some(_)) => HealthStatus::Failing,
            (Some(snapshot), None) if !snapshot.is_complete() => HealthStatus::Partial,
            (Some(_), None) => HealthStatus::Healthy,
        }
    }

    /// Возраст снимка, по нему потребитель решает, что данные устарели
    pub fn snapshot_age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.snapshot.as_ref().map(|s| now - s.captured_at())
    }

    pub(crate) fn record_success(&mut self, snapshot: Snapshot) {
        self.last_success = Some(snapshot.captured_at());
        self.snapshot = Some(Arc::new(snapshot));
        self.last_error = None;
        self.consecutive_failures = 0;
        self.polls += 1;
        self.phase = Phase::Idle;
    }

    pub(crate) fn record_failure(&mut self, failure: Failure) {
        self.last_error = Some(failure);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.polls += 1;
        self.phase = Phase::Idle;
    }
}
