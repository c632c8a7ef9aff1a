pub mod bootstrap;
pub mod driver;
pub mod schedule_sync;
pub mod status_service;
