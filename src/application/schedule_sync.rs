use crate::domain::clock::VirtualClock;
use crate::domain::models::{DaySchedule, ScheduleEvent, ScheduleSnapshot, parse_timestamp};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::schedule_cache::ScheduleCacheRepository;
use crate::infrastructure::schedule_client::ScheduleApiClient;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const REQUIRED_DATES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed {
        anchor_time: DateTime<Utc>,
        events: usize,
    },
    /// Another refresh was still in flight.
    Skipped,
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Pulls "today" and "tomorrow" from the schedule API into the cache and
/// re-anchors the virtual clock to the server's search time.
pub struct ScheduleSyncService<C, R>
where
    C: ScheduleApiClient,
    R: ScheduleCacheRepository,
{
    client: Arc<C>,
    cache: Arc<R>,
    clock: Arc<VirtualClock>,
    in_flight: AtomicBool,
}

impl<C, R> ScheduleSyncService<C, R>
where
    C: ScheduleApiClient,
    R: ScheduleCacheRepository,
{
    pub fn new(client: Arc<C>, cache: Arc<R>, clock: Arc<VirtualClock>) -> Self {
        Self {
            client,
            cache,
            clock,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Fetches and applies a new snapshot. On error the cache and clock are
    /// left exactly as they were.
    pub async fn refresh(&self) -> Result<RefreshOutcome, InfraError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::warn!("Schedule refresh still in progress, skipping this cycle");
            return Ok(RefreshOutcome::Skipped);
        };
        tracing::debug!("Fetching schedule data");

        let snapshot = self.fetch_schedule().await?;
        let Some(anchor_time) = snapshot.anchor_time else {
            return Err(InfraError::InvalidTimestamp {
                field: "searchTime",
                value: String::new(),
            });
        };
        let events = snapshot.events.len();

        self.cache.replace(snapshot)?;
        self.clock.anchor(anchor_time);

        tracing::info!("Schedule refreshed: {} events, anchored at {}", events, anchor_time.to_rfc3339());
        Ok(RefreshOutcome::Refreshed { anchor_time, events })
    }

    pub async fn fetch_schedule(&self) -> Result<ScheduleSnapshot, InfraError> {
        let dates = self.fetch_dates().await.unwrap_or_default();
        if dates.len() < REQUIRED_DATES {
            return Err(InfraError::InsufficientDates {
                available: dates.len(),
            });
        }

        let today = self.client.fetch_day(&dates[0]).await?;
        let tomorrow = self.client.fetch_day(&dates[1]).await?;

        let today_events = require_schedule(&today, &dates[0])?;
        let tomorrow_events = require_schedule(&tomorrow, &dates[1])?;

        let search_time = today.search_time.as_deref().unwrap_or_default();
        let anchor_time = parse_timestamp(search_time, "searchTime")?;

        let mut events = Vec::with_capacity(today_events.len() + tomorrow_events.len());
        events.extend_from_slice(today_events);
        events.extend_from_slice(tomorrow_events);

        Ok(ScheduleSnapshot {
            anchor_time: Some(anchor_time),
            events,
        })
    }

    /// A failed date lookup means "no data this cycle", not an error.
    async fn fetch_dates(&self) -> Option<Vec<String>> {
        match self.client.list_dates().await {
            Ok(dates) => Some(dates),
            Err(error) => {
                tracing::warn!("Error fetching schedule dates: {}", error);
                None
            }
        }
    }
}

fn require_schedule<'a>(day: &'a DaySchedule, date: &str) -> Result<&'a [ScheduleEvent], InfraError> {
    day.schedule
        .as_deref()
        .ok_or_else(|| InfraError::MissingScheduleField {
            date: date.to_string(),
        })
}
