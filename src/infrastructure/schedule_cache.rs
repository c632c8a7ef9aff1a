use crate::domain::models::ScheduleSnapshot;
use crate::infrastructure::error::InfraError;
use std::sync::Mutex;

pub trait ScheduleCacheRepository: Send + Sync {
    fn snapshot(&self) -> Result<ScheduleSnapshot, InfraError>;
    /// Swaps the whole snapshot; nothing from the previous one is kept.
    fn replace(&self, snapshot: ScheduleSnapshot) -> Result<(), InfraError>;
}

#[derive(Debug, Default)]
pub struct InMemoryScheduleCache {
    snapshot: Mutex<ScheduleSnapshot>,
}

impl ScheduleCacheRepository for InMemoryScheduleCache {
    fn snapshot(&self) -> Result<ScheduleSnapshot, InfraError> {
        let snapshot = self
            .snapshot
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("schedule cache lock poisoned: {error}")))?;
        Ok(snapshot.clone())
    }

    fn replace(&self, snapshot: ScheduleSnapshot) -> Result<(), InfraError> {
        let mut current = self
            .snapshot
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("schedule cache lock poisoned: {error}")))?;
        *current = snapshot;
        Ok(())
    }
}
