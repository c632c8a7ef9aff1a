use crate::application::schedule_sync::{RefreshOutcome, ScheduleSyncService};
use crate::application::status_service::{PushOutcome, StatusService};
use crate::domain::clock::VirtualClock;
use crate::infrastructure::presence::PresenceSink;
use crate::infrastructure::schedule_cache::ScheduleCacheRepository;
use crate::infrastructure::schedule_client::ScheduleApiClient;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverIntervals {
    pub refresh: Duration,
    pub status: Duration,
    pub tick: Duration,
}

impl Default for DriverIntervals {
    fn default() -> Self {
        Self {
            refresh: Duration::from_secs(20 * 60),
            status: Duration::from_secs(20),
            tick: Duration::from_secs(1),
        }
    }
}

/// Owns the three timers: slow refresh, status recompute and virtual-clock tick.
pub struct StatusDriver<C, R, P>
where
    C: ScheduleApiClient + 'static,
    R: ScheduleCacheRepository + 'static,
    P: PresenceSink + 'static,
{
    sync: Arc<ScheduleSyncService<C, R>>,
    status: Arc<StatusService<R, P>>,
    clock: Arc<VirtualClock>,
    intervals: DriverIntervals,
}

impl<C, R, P> StatusDriver<C, R, P>
where
    C: ScheduleApiClient + 'static,
    R: ScheduleCacheRepository + 'static,
    P: PresenceSink + 'static,
{
    pub fn new(
        sync: Arc<ScheduleSyncService<C, R>>,
        status: Arc<StatusService<R, P>>,
        clock: Arc<VirtualClock>,
        intervals: DriverIntervals,
    ) -> Self {
        Self {
            sync,
            status,
            clock,
            intervals,
        }
    }

    /// Runs an immediate refresh, then all timers until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        refresh_and_push(&self.sync, &self.status).await;

        let mut tasks: JoinSet<()> = JoinSet::new();

        {
            let sync = Arc::clone(&self.sync);
            let status = Arc::clone(&self.status);
            let period = self.intervals.refresh;
            tasks.spawn(async move {
                let mut timer = interval_at(Instant::now() + period, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    timer.tick().await;
                    refresh_and_push(&sync, &status).await;
                }
            });
        }

        {
            let status = Arc::clone(&self.status);
            let period = self.intervals.status;
            tasks.spawn(async move {
                let mut timer = interval_at(Instant::now() + period, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    timer.tick().await;
                    push_status(&status).await;
                }
            });
        }

        {
            let clock = Arc::clone(&self.clock);
            let period = self.intervals.tick;
            let step = chrono::Duration::from_std(period).unwrap_or_else(|_| chrono::Duration::seconds(1));
            tasks.spawn(async move {
                let mut timer = interval_at(Instant::now() + period, period);
                loop {
                    timer.tick().await;
                    clock.tick(step);
                }
            });
        }

        tracing::info!(
            "Status driver started: refresh every {:?}, status every {:?}, tick every {:?}",
            self.intervals.refresh,
            self.intervals.status,
            self.intervals.tick
        );

        shutdown.await;
        tracing::info!("Shutting down status driver");
        tasks.shutdown().await;
    }
}

pub async fn refresh_and_push<C, R, P>(sync: &ScheduleSyncService<C, R>, status: &StatusService<R, P>)
where
    C: ScheduleApiClient,
    R: ScheduleCacheRepository,
    P: PresenceSink,
{
    match sync.refresh().await {
        Ok(RefreshOutcome::Refreshed { anchor_time, events }) => {
            tracing::debug!("Cache holds {} events, search time {}", events, anchor_time.to_rfc3339());
        }
        Ok(RefreshOutcome::Skipped) => {}
        Err(error) => tracing::error!("Error fetching data from API: {}", error),
    }
    push_status(status).await;
}

async fn push_status<R, P>(status: &StatusService<R, P>)
where
    R: ScheduleCacheRepository,
    P: PresenceSink,
{
    match status.push().await {
        Ok(PushOutcome::Changed(text)) => tracing::info!("Status set to: {}", text),
        Ok(PushOutcome::Unchanged) => {}
        Err(error) => tracing::error!("Failed to update presence: {}", error),
    }
}
