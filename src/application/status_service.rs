use crate::domain::clock::Clock;
use crate::domain::status::StatusComposer;
use crate::domain::weekly_cycle::WeeklyCycleClock;
use crate::infrastructure::config::PresenceStatus;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::presence::PresenceSink;
use crate::infrastructure::schedule_cache::ScheduleCacheRepository;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Changed(String),
    Unchanged,
}

pub struct StatusService<R, P>
where
    R: ScheduleCacheRepository,
    P: PresenceSink,
{
    cache: Arc<R>,
    sink: Arc<P>,
    search_clock: Arc<dyn Clock>,
    wall_clock: Arc<dyn Clock>,
    cycle: WeeklyCycleClock,
    composer: StatusComposer,
    presence_status: PresenceStatus,
    fallback_status: String,
    current_status: Mutex<String>,
}

impl<R, P> StatusService<R, P>
where
    R: ScheduleCacheRepository,
    P: PresenceSink,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cache: Arc<R>,
        sink: Arc<P>,
        search_clock: Arc<dyn Clock>,
        wall_clock: Arc<dyn Clock>,
        cycle: WeeklyCycleClock,
        composer: StatusComposer,
        presence_status: PresenceStatus,
        fallback_status: String,
    ) -> Self {
        Self {
            cache,
            sink,
            search_clock,
            wall_clock,
            cycle,
            composer,
            presence_status,
            fallback_status,
            current_status: Mutex::new(String::new()),
        }
    }

    /// Matches cached events against the search clock; the icon follows wall time.
    pub fn compose_status(&self) -> Result<String, InfraError> {
        let snapshot = self.cache.snapshot()?;
        let reference = self.search_clock.now();
        let icon = self.cycle.current_icon(self.wall_clock.now());
        self.composer.compose(&snapshot.events, reference, icon)
    }

    pub fn status_or_fallback(&self) -> String {
        match self.compose_status() {
            Ok(status) => status,
            Err(error) => {
                tracing::error!("Failed to compose status: {}", error);
                self.fallback_status.clone()
            }
        }
    }

    pub fn current_status(&self) -> String {
        self.current_status
            .lock()
            .map(|current| current.clone())
            .unwrap_or_default()
    }

    /// Sends the status to the sink only when it differs from the last one sent.
    pub async fn push(&self) -> Result<PushOutcome, InfraError> {
        let status = self.status_or_fallback();
        if self.current_status() == status {
            tracing::debug!("Status unchanged: {}", status);
            return Ok(PushOutcome::Unchanged);
        }

        self.sink.set_presence(&status, self.presence_status).await?;

        let mut current = self
            .current_status
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("current status lock poisoned: {error}")))?;
        current.clone_from(&status);
        tracing::debug!("Status pushed to {}: {}", self.sink.name(), status);
        Ok(PushOutcome::Changed(status))
    }
}
