pub mod config;
pub mod error;
pub mod logging;
pub mod presence;
pub mod schedule_cache;
pub mod schedule_client;
