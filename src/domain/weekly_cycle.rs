use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

pub const MINUTES_PER_WEEK: u32 = 7 * 24 * 60;
pub const DAY_PHASE_MINUTES: u32 = 120;
pub const NIGHT_PHASE_MINUTES: u32 = 30;
const WEEKLY_SHIFT_MINUTES: i64 = 30;
const LAST_QUARTER_MINUTES: u32 = 15;
const THREE_QUARTER_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleIcon {
    Day,
    Night,
    DayWaning,
    DayEnding,
}

impl CycleIcon {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "🌞",
            Self::Night => "🌚",
            Self::DayWaning => "🌔",
            Self::DayEnding => "🌓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyPeriod {
    pub start_minute: u32,
    pub end_minute: u32,
    pub icon: CycleIcon,
}

/// Alternating day/night periods starting at Sunday 00:00. The final day
/// period runs past the end of the week so shifted minutes stay covered.
pub fn weekly_timetable() -> Vec<WeeklyPeriod> {
    let mut periods = Vec::new();
    let mut start_minute = 0;
    let mut icon = CycleIcon::Day;

    while start_minute < MINUTES_PER_WEEK {
        let duration = match icon {
            CycleIcon::Night => NIGHT_PHASE_MINUTES,
            _ => DAY_PHASE_MINUTES,
        };
        periods.push(WeeklyPeriod {
            start_minute,
            end_minute: start_minute + duration,
            icon,
        });
        start_minute += duration;
        icon = match icon {
            CycleIcon::Night => CycleIcon::Day,
            _ => CycleIcon::Night,
        };
    }

    periods
}

pub fn icon_at_minute(minute: u32) -> CycleIcon {
    weekly_timetable()
        .into_iter()
        .find(|period| minute >= period.start_minute && minute < period.end_minute)
        .map(|period| {
            let remaining = period.end_minute - minute;
            match period.icon {
                CycleIcon::Day if remaining <= LAST_QUARTER_MINUTES => CycleIcon::DayEnding,
                CycleIcon::Day if remaining <= THREE_QUARTER_MINUTES => CycleIcon::DayWaning,
                icon => icon,
            }
        })
        .unwrap_or(CycleIcon::Day)
}

/// Maps wall time onto the in-game day/night cycle.
///
/// Minutes are counted from Sunday 00:00 in `timezone`. Every full week since
/// `epoch` pushes the cycle 30 minutes further, wrapping every four weeks.
#[derive(Debug, Clone)]
pub struct WeeklyCycleClock {
    timezone: Tz,
    epoch: NaiveDate,
}

impl WeeklyCycleClock {
    pub fn new(timezone: Tz, epoch: NaiveDate) -> Self {
        Self { timezone, epoch }
    }

    pub fn minute_of_week(&self, now: DateTime<Utc>) -> u32 {
        let local = now.with_timezone(&self.timezone);
        let base = local.weekday().num_days_from_sunday() * 24 * 60
            + local.hour() * 60
            + local.minute();

        let weeks_elapsed = (local.date_naive() - self.epoch).num_days().div_euclid(7);
        let shift = (weeks_elapsed * WEEKLY_SHIFT_MINUTES).rem_euclid(i64::from(DAY_PHASE_MINUTES));

        base + shift as u32
    }

    pub fn current_icon(&self, now: DateTime<Utc>) -> CycleIcon {
        icon_at_minute(self.minute_of_week(now))
    }
}
