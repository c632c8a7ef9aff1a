use crate::domain::models::{ScheduleEvent, parse_timestamp};
use crate::domain::weekly_cycle::CycleIcon;
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};

pub const PENDING_SYMBOL: &str = "⏱";
pub const ACTIVE_SYMBOL: &str = "⚔";
pub const NO_EVENTS_TEXT: &str = "No events available";
const MISSING_GUILD_NAME: &str = "None";
const MISSING_EVENT_TYPE_INITIAL: &str = "N";

#[derive(Debug, Clone)]
pub struct StatusComposer {
    window_before: Duration,
    window_after: Duration,
    display_offset: FixedOffset,
}

impl Default for StatusComposer {
    fn default() -> Self {
        Self {
            window_before: Duration::minutes(25),
            window_after: Duration::minutes(35),
            display_offset: FixedOffset::east_opt(7 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

struct EventGroup<'a> {
    trigger_time: &'a str,
    trigger_at: DateTime<Utc>,
    labels: Vec<String>,
}

impl StatusComposer {
    pub fn new(window_before: Duration, window_after: Duration, display_offset: FixedOffset) -> Self {
        Self {
            window_before,
            window_after,
            display_offset,
        }
    }

    /// Renders the single-line status for the first time bucket inside the
    /// matching window around `reference`. Later buckets are never shown.
    pub fn compose(
        &self,
        events: &[ScheduleEvent],
        reference: DateTime<Utc>,
        icon: CycleIcon,
    ) -> Result<String, InfraError> {
        let groups = self.group_events(events, reference)?;
        let icon = icon.as_str();

        let Some(group) = groups.first() else {
            return Ok(format!("{icon}{NO_EVENTS_TEXT}"));
        };

        let symbol = if reference < group.trigger_at {
            PENDING_SYMBOL
        } else {
            ACTIVE_SYMBOL
        };
        let time = group
            .trigger_at
            .with_timezone(&self.display_offset)
            .format("%H:%M");

        Ok(format!("{icon}{symbol}{time}: {}", group.labels.join(", ")))
    }

    fn group_events<'a>(
        &self,
        events: &'a [ScheduleEvent],
        reference: DateTime<Utc>,
    ) -> Result<Vec<EventGroup<'a>>, InfraError> {
        let window_start = reference
            .checked_sub_signed(self.window_before)
            .ok_or_else(|| InfraError::Composition("matching window starts out of range".to_string()))?;
        let window_end = reference
            .checked_add_signed(self.window_after)
            .ok_or_else(|| InfraError::Composition("matching window ends out of range".to_string()))?;
        let mut groups: Vec<EventGroup<'a>> = Vec::new();

        for event in events {
            let Some(trigger_time) = event.trigger_time.as_deref() else {
                tracing::debug!("skipping event without trigger time");
                continue;
            };
            let Ok(trigger_at) = parse_timestamp(trigger_time, "triggerTime") else {
                tracing::debug!("skipping event with unparseable trigger time: {}", trigger_time);
                continue;
            };
            if trigger_at < window_start || trigger_at > window_end {
                continue;
            }

            let label = event_label(event)?;
            match groups
                .iter_mut()
                .find(|group| group.trigger_time == trigger_time)
            {
                Some(group) => group.labels.push(label),
                None => groups.push(EventGroup {
                    trigger_time,
                    trigger_at,
                    labels: vec![label],
                }),
            }
        }

        Ok(groups)
    }
}

pub fn event_label(event: &ScheduleEvent) -> Result<String, InfraError> {
    let name = event.name.as_deref().ok_or_else(|| {
        InfraError::Composition(format!(
            "event at {} has no name",
            event.trigger_time.as_deref().unwrap_or("unknown time")
        ))
    })?;
    match event.guild_name.as_deref() {
        Some(guild_name) => Ok(guild_label(name, guild_name)),
        None => short_event_label(name, event.event_type_name.as_deref()),
    }
}

/// Compacts a guild name to its first word plus the initial of the second.
///
/// A name already carrying the `[xx|y]` tag built from the event name is left
/// as is, so applying this to its own output changes nothing.
pub fn guild_label(event_name: &str, guild_name: &str) -> String {
    let guild_name = if guild_name.is_empty() {
        MISSING_GUILD_NAME
    } else {
        guild_name
    };

    let name_parts: Vec<&str> = event_name.split(' ').collect();
    let first_two: String = name_parts
        .first()
        .map(|part| part.chars().take(2).collect())
        .unwrap_or_default();
    let last_initial: String = name_parts
        .last()
        .and_then(|part| part.chars().next())
        .map(String::from)
        .unwrap_or_default();
    let tag = format!("[{first_two}|{last_initial}]");

    if guild_name.contains(&tag) {
        return guild_name.to_string();
    }

    let mut guild_parts = guild_name.split(' ');
    let base = guild_parts.next().unwrap_or_default();
    match guild_parts.next() {
        Some(second) => {
            let initial: String = second.chars().take(1).collect();
            format!("{base} {initial}")
        }
        None => base.to_string(),
    }
}

/// `"Raid: Dragon Hunt"` of type `"Boss"` becomes `"Dragon[o]"`.
pub fn short_event_label(name: &str, event_type_name: Option<&str>) -> Result<String, InfraError> {
    let short_name = if name.contains(':') {
        name.split(": ").nth(1).ok_or_else(|| {
            InfraError::Composition(format!("event name '{name}' has no text after ': '"))
        })?
    } else {
        name
    };
    let short_name = short_name.split(' ').next().unwrap_or_default();

    let type_initial: String = match event_type_name {
        Some(type_name) if !type_name.is_empty() => type_name.chars().skip(1).take(1).collect(),
        _ => MISSING_EVENT_TYPE_INITIAL.to_string(),
    };

    Ok(format!("{short_name}[{type_initial}]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn event(trigger_time: &str, name: &str, event_type: Option<&str>, guild: Option<&str>) -> ScheduleEvent {
        ScheduleEvent {
            trigger_time: Some(trigger_time.to_string()),
            name: Some(name.to_string()),
            event_type_name: event_type.map(ToOwned::to_owned),
            guild_name: guild.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn short_label_takes_word_after_colon_and_type_initial() {
        let label = short_event_label("Raid: Dragon Hunt", Some("Boss")).expect("label");
        assert_eq!(label, "Dragon[o]");
    }

    #[test]
    fn short_label_without_colon_uses_first_word() {
        assert_eq!(short_event_label("Castle Siege", Some("PvP")).expect("label"), "Castle[v]");
    }

    #[test]
    fn short_label_defaults_missing_or_empty_type_to_n() {
        assert_eq!(short_event_label("Boonah Boss", None).expect("label"), "Boonah[N]");
        assert_eq!(short_event_label("Boonah Boss", Some("")).expect("label"), "Boonah[N]");
    }

    #[test]
    fn short_label_with_one_character_type_has_empty_tag() {
        assert_eq!(short_event_label("Field Boss", Some("B")).expect("label"), "Field[]");
    }

    #[test]
    fn short_label_fails_when_colon_has_no_following_space() {
        let result = short_event_label("Raid:Dragon", Some("Boss"));
        assert!(matches!(result, Err(InfraError::Composition(_))));
    }

    #[test]
    fn guild_label_keeps_first_word_and_second_initial() {
        assert_eq!(guild_label("Castle Siege", "Iron Wolves Clan"), "Iron W");
        assert_eq!(guild_label("Castle Siege", "Ironclad"), "Ironclad");
    }

    #[test]
    fn empty_guild_name_becomes_none() {
        assert_eq!(guild_label("Castle Siege", ""), "None");
        let labelled = event_label(&event("2024-06-08T07:00:00Z", "Castle Siege", None, Some("")))
            .expect("label");
        assert_eq!(labelled, "None");
    }

    #[test]
    fn guild_name_containing_tag_is_kept() {
        assert_eq!(
            guild_label("Castle Siege", "Iron Wolves [Ca|S]"),
            "Iron Wolves [Ca|S]"
        );
    }

    #[test]
    fn composes_pending_status_for_upcoming_group() {
        let composer = StatusComposer::default();
        let events = vec![
            event("2024-06-08T07:30:00Z", "Raid: Dragon Hunt", Some("Boss"), None),
            event("2024-06-08T07:30:00Z", "Castle Siege", None, Some("Iron Wolves")),
        ];

        let status = composer
            .compose(&events, fixed_time("2024-06-08T07:10:00Z"), CycleIcon::Day)
            .expect("status");

        assert_eq!(status, "🌞⏱14:30: Dragon[o], Iron W");
    }

    #[test]
    fn reference_equal_to_trigger_time_is_active() {
        let composer = StatusComposer::default();
        let events = vec![event("2024-06-08T07:30:00Z", "Raid: Dragon Hunt", Some("Boss"), None)];

        let status = composer
            .compose(&events, fixed_time("2024-06-08T07:30:00Z"), CycleIcon::Night)
            .expect("status");

        assert_eq!(status, "🌚⚔14:30: Dragon[o]");
    }

    #[test]
    fn no_event_in_window_reports_no_events() {
        let composer = StatusComposer::default();
        let events = vec![
            event("2024-06-08T06:44:59Z", "Too Early", None, None),
            event("2024-06-08T07:45:01Z", "Too Late", None, None),
        ];

        let status = composer
            .compose(&events, fixed_time("2024-06-08T07:10:00Z"), CycleIcon::DayEnding)
            .expect("status");

        assert_eq!(status, "🌓No events available");
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let composer = StatusComposer::default();
        let reference = fixed_time("2024-06-08T07:00:00Z");

        let early = vec![event("2024-06-08T06:35:00Z", "Edge Early", None, None)];
        let late = vec![event("2024-06-08T07:35:00Z", "Edge Late", None, None)];

        assert_eq!(
            composer.compose(&early, reference, CycleIcon::Day).expect("status"),
            "🌞⚔13:35: Edge[N]"
        );
        assert_eq!(
            composer.compose(&late, reference, CycleIcon::Day).expect("status"),
            "🌞⏱14:35: Edge[N]"
        );
    }

    #[test]
    fn only_first_seen_group_is_rendered() {
        let composer = StatusComposer::default();
        let events = vec![
            event("2024-06-08T07:20:00Z", "Later Listed", None, None),
            event("2024-06-08T07:00:00Z", "Earlier Time", None, None),
        ];

        let status = composer
            .compose(&events, fixed_time("2024-06-08T07:05:00Z"), CycleIcon::Day)
            .expect("status");

        assert_eq!(status, "🌞⏱14:20: Later[N]");
    }

    #[test]
    fn grouping_uses_exact_trigger_string() {
        let composer = StatusComposer::default();
        let events = vec![
            event("2024-06-08T07:30:00Z", "First One", None, None),
            event("2024-06-08T07:30:00.000Z", "Same Instant", None, None),
            event("2024-06-08T07:30:00Z", "Second One", None, None),
        ];

        let status = composer
            .compose(&events, fixed_time("2024-06-08T07:10:00Z"), CycleIcon::Day)
            .expect("status");

        assert_eq!(status, "🌞⏱14:30: First[N], Second[N]");
    }

    #[test]
    fn unparseable_trigger_times_are_skipped() {
        let composer = StatusComposer::default();
        let events = vec![
            event("garbage", "Broken Event", None, None),
            event("2024-06-08T07:30:00Z", "Raid: Dragon Hunt", Some("Boss"), None),
        ];

        let status = composer
            .compose(&events, fixed_time("2024-06-08T07:10:00Z"), CycleIcon::Day)
            .expect("status");

        assert_eq!(status, "🌞⏱14:30: Dragon[o]");
    }

    #[test]
    fn malformed_name_in_window_fails_composition() {
        let composer = StatusComposer::default();
        let events = vec![event("2024-06-08T07:30:00Z", "Raid:Dragon", Some("Boss"), None)];

        let result = composer.compose(&events, fixed_time("2024-06-08T07:10:00Z"), CycleIcon::Day);

        assert!(matches!(result, Err(InfraError::Composition(_))));
    }

    #[test]
    fn nameless_event_in_window_fails_composition() {
        let composer = StatusComposer::default();
        let mut nameless = event("2024-06-08T07:30:00Z", "unused", None, None);
        nameless.name = None;

        let result = composer.compose(&[nameless], fixed_time("2024-06-08T07:10:00Z"), CycleIcon::Day);

        assert!(matches!(result, Err(InfraError::Composition(_))));
    }

    #[test]
    fn broken_events_outside_window_do_not_affect_status() {
        let composer = StatusComposer::default();
        let mut nameless = event("2024-06-09T23:30:00Z", "unused", None, None);
        nameless.name = None;
        let mut timeless = event("unused", "Placeholder", None, None);
        timeless.trigger_time = None;
        let events = vec![
            nameless,
            timeless,
            event("2024-06-08T07:30:00Z", "Raid: Dragon Hunt", Some("Boss"), None),
        ];

        let status = composer
            .compose(&events, fixed_time("2024-06-08T07:10:00Z"), CycleIcon::Day)
            .expect("status");

        assert_eq!(status, "🌞⏱14:30: Dragon[o]");
    }

    #[test]
    fn out_of_range_window_fails_composition_instead_of_panicking() {
        let composer = StatusComposer::new(
            Duration::days(100_000_000),
            Duration::days(100_000_000),
            FixedOffset::east_opt(7 * 3600).expect("valid offset"),
        );

        let result = composer.compose(&[], fixed_time("2024-06-08T07:10:00Z"), CycleIcon::Day);

        assert!(matches!(result, Err(InfraError::Composition(_))));
    }

    #[test]
    fn display_offset_is_configurable() {
        let composer = StatusComposer::new(
            Duration::minutes(25),
            Duration::minutes(35),
            FixedOffset::east_opt(9 * 3600).expect("valid offset"),
        );
        let events = vec![event("2024-06-08T20:30:00Z", "Night Raid", None, None)];

        let status = composer
            .compose(&events, fixed_time("2024-06-08T20:10:00Z"), CycleIcon::Day)
            .expect("status");

        assert_eq!(status, "🌞⏱05:30: Night[N]");
    }

    fn word() -> impl Strategy<Value = String> {
        "[A-Za-z]{1,8}".prop_map(|value| value.to_string())
    }

    // Property: events outside the matching window never appear in the status
    proptest! {
        #[test]
        fn events_outside_window_never_appear(offset_minutes in -600i64..600i64, name in word()) {
            let composer = StatusComposer::default();
            let reference = fixed_time("2024-06-08T07:00:00Z");
            let trigger = reference + Duration::minutes(offset_minutes);
            let events = vec![event(&trigger.to_rfc3339(), &format!("{name}Marker"), None, None)];

            let status = composer.compose(&events, reference, CycleIcon::Day).expect("status");
            let inside = (-25..=35).contains(&offset_minutes);

            prop_assert_eq!(status.contains(&format!("{name}Marker")), inside);
        }
    }

    // Property: events sharing a trigger time are always listed together
    proptest! {
        #[test]
        fn same_trigger_time_events_share_one_group(names in proptest::collection::vec(word(), 1..6)) {
            let composer = StatusComposer::default();
            let events: Vec<ScheduleEvent> = names
                .iter()
                .map(|name| event("2024-06-08T07:15:00Z", name, None, None))
                .collect();

            let status = composer
                .compose(&events, fixed_time("2024-06-08T07:00:00Z"), CycleIcon::Day)
                .expect("status");
            let expected: Vec<String> = names.iter().map(|name| format!("{name}[N]")).collect();

            prop_assert_eq!(status, format!("🌞⏱14:15: {}", expected.join(", ")));
        }
    }

    // Property: composing twice over the same inputs yields the same string
    proptest! {
        #[test]
        fn compose_is_idempotent(offset_minutes in -30i64..40i64, guild in proptest::option::of(word())) {
            let composer = StatusComposer::default();
            let reference = fixed_time("2024-06-08T07:00:00Z");
            let trigger = (reference + Duration::minutes(offset_minutes)).to_rfc3339();
            let events = vec![event(&trigger, "Castle Siege", Some("PvP"), guild.as_deref())];

            let first = composer.compose(&events, reference, CycleIcon::Night).expect("status");
            let second = composer.compose(&events, reference, CycleIcon::Night).expect("status");

            prop_assert_eq!(first, second);
        }
    }

    // Property: compacting a guild name twice equals compacting it once
    proptest! {
        #[test]
        fn guild_compaction_is_idempotent(
            event_name in "[A-Za-z ]{0,20}",
            guild_name in "[A-Za-z ]{0,20}"
        ) {
            let once = guild_label(&event_name, &guild_name);
            let twice = guild_label(&event_name, &once);
            prop_assert_eq!(once, twice);
        }
    }
}
