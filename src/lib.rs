mod application;
mod domain;
mod infrastructure;

pub use application::driver::{DriverIntervals, StatusDriver};
pub use domain::clock::{Clock, SystemClock, VirtualClock};
pub use domain::models::{ScheduleEvent, ScheduleSnapshot};
pub use domain::status::StatusComposer;
pub use domain::weekly_cycle::{CycleIcon, WeeklyCycleClock};
pub use infrastructure::config::{AppConfig, PresenceStatus};
pub use infrastructure::error::InfraError;
pub use infrastructure::presence::{PresenceSink, TracingPresenceSink};

use application::bootstrap::bootstrap_workspace;
use application::schedule_sync::ScheduleSyncService;
use application::status_service::StatusService;
use chrono::{Duration, FixedOffset};
use infrastructure::logging::init_logging;
use infrastructure::schedule_cache::InMemoryScheduleCache;
use infrastructure::schedule_client::ReqwestScheduleApiClient;
use std::path::PathBuf;
use std::sync::Arc;

fn status_composer(config: &AppConfig) -> Result<StatusComposer, InfraError> {
    let display_offset = FixedOffset::east_opt(config.display_utc_offset_hours * 3600).ok_or_else(|| {
        InfraError::InvalidConfig(format!(
            "displayUtcOffsetHours out of range: {}",
            config.display_utc_offset_hours
        ))
    })?;
    Ok(StatusComposer::new(
        Duration::minutes(config.window_before_minutes),
        Duration::minutes(config.window_after_minutes),
        display_offset,
    ))
}

fn driver_intervals(config: &AppConfig) -> DriverIntervals {
    DriverIntervals {
        refresh: std::time::Duration::from_secs(config.refresh_interval_secs),
        status: std::time::Duration::from_secs(config.status_interval_secs),
        tick: std::time::Duration::from_millis(config.tick_interval_ms),
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", error);
        std::future::pending::<()>().await;
    }
}

/// Bootstraps `workspace_root`, then publishes schedule status to the log
/// sink until Ctrl+C.
pub async fn run(workspace_root: PathBuf) -> Result<(), InfraError> {
    let bootstrap = bootstrap_workspace(&workspace_root)?;
    let _log_guard = init_logging(&bootstrap.logs_dir);
    let config = bootstrap.config;
    tracing::info!("Workspace root: {}", bootstrap.workspace_root.display());

    let client = Arc::new(ReqwestScheduleApiClient::new(&config)?);
    let cache = Arc::new(InMemoryScheduleCache::default());
    let clock = Arc::new(VirtualClock::new());
    let cycle = WeeklyCycleClock::new(config.timezone()?, config.cycle_epoch()?);

    let sync = Arc::new(ScheduleSyncService::new(client, Arc::clone(&cache), Arc::clone(&clock)));
    let status = Arc::new(StatusService::new(
        cache,
        Arc::new(TracingPresenceSink),
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::new(SystemClock),
        cycle,
        status_composer(&config)?,
        config.presence_status,
        config.fallback_status.clone(),
    ));

    StatusDriver::new(sync, status, clock, driver_intervals(&config))
        .run(shutdown_signal())
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_intervals_follow_config() {
        let config = AppConfig {
            refresh_interval_secs: 600,
            status_interval_secs: 10,
            tick_interval_ms: 500,
            ..AppConfig::default()
        };

        let intervals = driver_intervals(&config);

        assert_eq!(intervals.refresh, std::time::Duration::from_secs(600));
        assert_eq!(intervals.status, std::time::Duration::from_secs(10));
        assert_eq!(intervals.tick, std::time::Duration::from_millis(500));
    }

    #[test]
    fn default_config_intervals_match_driver_defaults() {
        assert_eq!(driver_intervals(&AppConfig::default()), DriverIntervals::default());
    }

    #[test]
    fn status_composer_uses_configured_offset() {
        let config = AppConfig {
            display_utc_offset_hours: 0,
            ..AppConfig::default()
        };
        let composer = status_composer(&config).expect("composer");
        let events = vec![ScheduleEvent {
            trigger_time: Some("2024-06-08T07:30:00Z".to_string()),
            name: Some("Raid: Dragon Hunt".to_string()),
            event_type_name: Some("Boss".to_string()),
            guild_name: None,
        }];
        let reference = chrono::DateTime::parse_from_rfc3339("2024-06-08T07:30:00Z")
            .expect("valid datetime")
            .with_timezone(&chrono::Utc);

        let status = composer.compose(&events, reference, CycleIcon::Night).expect("status");
        assert_eq!(status, "🌚⚔07:30: Dragon[o]");
    }
}
