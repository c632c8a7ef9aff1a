pub mod clock;
pub mod models;
pub mod status;
pub mod weekly_cycle;
