use crate::infrastructure::config::PresenceStatus;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;

/// Destination for the rendered status line, usually a chat client's custom
/// activity.
#[async_trait]
pub trait PresenceSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn set_presence(&self, activity: &str, status: PresenceStatus) -> Result<(), InfraError>;
}

/// Writes presence updates to the log. Used when no chat client is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenceSink;

#[async_trait]
impl PresenceSink for TracingPresenceSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn set_presence(&self, activity: &str, status: PresenceStatus) -> Result<(), InfraError> {
        tracing::info!(status = status.as_str(), "Presence set to: {}", activity);
        Ok(())
    }
}
