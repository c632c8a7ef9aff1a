use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Search time that advances by ticks instead of following the wall clock.
///
/// Unset until the first tick or anchor. Each successful fetch re-anchors it
/// to the server's reported time, which discards any accumulated drift.
pub struct VirtualClock {
    search_time: Mutex<Option<DateTime<Utc>>>,
    now_provider: NowProvider,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self {
            search_time: Mutex::new(None),
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn search_time(&self) -> Option<DateTime<Utc>> {
        *self.lock()
    }

    pub fn anchor(&self, time: DateTime<Utc>) {
        *self.lock() = Some(time);
    }

    /// Starts from wall time when unset, otherwise steps forward by `step`.
    pub fn tick(&self, step: Duration) -> DateTime<Utc> {
        let mut search_time = self.lock();
        let next = match *search_time {
            Some(current) => current + step,
            None => (self.now_provider)(),
        };
        *search_time = Some(next);
        next
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<DateTime<Utc>>> {
        // A poisoned lock still holds a valid timestamp.
        self.search_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        self.search_time()
            .unwrap_or_else(|| (self.now_provider)())
    }
}
