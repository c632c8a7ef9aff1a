use crate::infrastructure::error::InfraError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single scheduled in-game event as reported by the day-schedule endpoint.
///
/// `trigger_time` is kept verbatim because events are grouped by the exact
/// string the server sent, not by the parsed instant. Fields that are missing,
/// null or not strings read as `None`; a broken event only matters once it
/// lands inside the matching window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub trigger_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub event_type_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub guild_name: Option<String>,
}

impl ScheduleEvent {
    pub fn trigger_at(&self) -> Result<DateTime<Utc>, InfraError> {
        match self.trigger_time.as_deref() {
            Some(value) => parse_timestamp(value, "triggerTime"),
            None => Err(InfraError::InvalidTimestamp {
                field: "triggerTime",
                value: "null".to_string(),
            }),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        _ => None,
    })
}

/// Payload of the day-schedule endpoint. `schedule` stays optional so a
/// missing array can be told apart from an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    #[serde(default)]
    pub search_time: Option<String>,
    #[serde(default)]
    pub schedule: Option<Vec<ScheduleEvent>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScheduleSnapshot {
    pub anchor_time: Option<DateTime<Utc>>,
    pub events: Vec<ScheduleEvent>,
}

impl ScheduleSnapshot {
    pub fn is_empty(&self) -> bool {
        self.anchor_time.is_none() && self.events.is_empty()
    }
}

/// Parses server timestamps. Offset-less values are read as UTC.
pub fn parse_timestamp(value: &str, field: &'static str) -> Result<DateTime<Utc>, InfraError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| InfraError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}
