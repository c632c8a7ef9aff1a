use crate::infrastructure::error::InfraError;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const SUPPORTED_SCHEMA: u64 = 1;
const MAX_WINDOW_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Idle,
    Dnd,
    Invisible,
}

impl PresenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Dnd => "dnd",
            Self::Invisible => "invisible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub schema: u8,
    pub api_base_url: String,
    pub dates_locale: String,
    pub schedule_locale: String,
    pub schedule_id: u32,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
    pub request_timeout_secs: u64,
    pub timezone: String,
    pub cycle_epoch: String,
    pub display_utc_offset_hours: i32,
    pub refresh_interval_secs: u64,
    pub status_interval_secs: u64,
    pub tick_interval_ms: u64,
    pub window_before_minutes: i64,
    pub window_after_minutes: i64,
    pub presence_status: PresenceStatus,
    pub fallback_status: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema: 1,
            api_base_url: "https://api-goats.plaync.com/tl/v2.0/game/schedule".to_string(),
            dates_locale: "ko-KR".to_string(),
            schedule_locale: "en-US".to_string(),
            schedule_id: 23,
            user_agent: "request".to_string(),
            accept_invalid_certs: true,
            request_timeout_secs: 30,
            timezone: "Asia/Bangkok".to_string(),
            cycle_epoch: "2024-05-26".to_string(),
            display_utc_offset_hours: 7,
            refresh_interval_secs: 20 * 60,
            status_interval_secs: 20,
            tick_interval_ms: 1000,
            window_before_minutes: 25,
            window_after_minutes: 35,
            presence_status: PresenceStatus::Dnd,
            fallback_status: "ไม่สามารถดึงข้อมูลได้".to_string(),
        }
    }
}

impl AppConfig {
    pub fn timezone(&self) -> Result<Tz, InfraError> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|error| InfraError::InvalidConfig(format!("invalid timezone '{}': {error}", self.timezone)))
    }

    pub fn cycle_epoch(&self) -> Result<NaiveDate, InfraError> {
        NaiveDate::parse_from_str(self.cycle_epoch.trim(), "%Y-%m-%d").map_err(|error| {
            InfraError::InvalidConfig(format!("invalid cycleEpoch '{}': {error}", self.cycle_epoch))
        })
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        if self.api_base_url.trim().is_empty() {
            return Err(InfraError::InvalidConfig("apiBaseUrl must not be empty".to_string()));
        }
        if self.refresh_interval_secs == 0 || self.status_interval_secs == 0 || self.tick_interval_ms == 0 {
            return Err(InfraError::InvalidConfig("timer intervals must be greater than zero".to_string()));
        }
        for (field, minutes) in [
            ("windowBeforeMinutes", self.window_before_minutes),
            ("windowAfterMinutes", self.window_after_minutes),
        ] {
            if !(0..=MAX_WINDOW_MINUTES).contains(&minutes) {
                return Err(InfraError::InvalidConfig(format!(
                    "{field} must be between 0 and {MAX_WINDOW_MINUTES}, got {minutes}"
                )));
            }
        }
        if !(-23..=23).contains(&self.display_utc_offset_hours) {
            return Err(InfraError::InvalidConfig(format!(
                "displayUtcOffsetHours out of range: {}",
                self.display_utc_offset_hours
            )));
        }
        self.timezone()?;
        self.cycle_epoch()?;
        Ok(())
    }
}

pub fn ensure_default_config(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&AppConfig::default())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

pub fn load_config(config_dir: &Path) -> Result<AppConfig, InfraError> {
    let path = config_dir.join(APP_JSON);
    let raw = fs::read_to_string(&path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != SUPPORTED_SCHEMA {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }

    let config: AppConfig = serde_json::from_value(parsed)?;
    config.validate()?;
    Ok(config)
}
