//! Pure reminder evaluation.
//!
//! Given a user's settings and the current instant, decides which reminder
//! categories are due. Nothing here performs I/O; callers commit the returned
//! bookkeeping and create notifications themselves.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, TimeDelta, Timelike, Utc};

use crate::db::models::{ClockTime, ReminderCategory, ReminderConfig, WellnessSettings};

/// Derived reminder state. Only `pause_until` and `active_hours` are stored;
/// `Paused` turns back into `Active` lazily once `now` passes the pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Active,
    Paused { until: DateTime<Utc> },
    OutsideActiveHours,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub state: ReminderState,
    pub fired: Vec<ReminderCategory>,
    pub updated_last_notified: BTreeMap<ReminderCategory, DateTime<Utc>>,
}

impl Evaluation {
    fn idle(state: ReminderState) -> Self {
        Self {
            state,
            fired: Vec::new(),
            updated_last_notified: BTreeMap::new(),
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, ReminderState::Paused { .. })
    }

    pub fn pause_until(&self) -> Option<DateTime<Utc>> {
        match self.state {
            ReminderState::Paused { until } => Some(until),
            _ => None,
        }
    }

    pub fn is_outside_active_hours(&self) -> bool {
        self.state == ReminderState::OutsideActiveHours
    }
}

/// Wall-clock time of `now` in its own offset, truncated to the minute.
pub fn wall_clock(now: &DateTime<FixedOffset>) -> ClockTime {
    // hour() is 0..=23 and minute() is 0..=59, so this is always Some.
    ClockTime::from_hm(now.hour(), now.minute()).unwrap_or(ClockTime::MIDNIGHT)
}

pub fn reminder_state(settings: &WellnessSettings, now: &DateTime<FixedOffset>) -> ReminderState {
    let instant = now.with_timezone(&Utc);
    if let Some(until) = settings.pause_until {
        if until > instant {
            return ReminderState::Paused { until };
        }
    }
    if !settings.active_hours.contains(wall_clock(now)) {
        return ReminderState::OutsideActiveHours;
    }
    ReminderState::Active
}

/// A category is due when it is enabled and more than its interval has
/// elapsed since it last fired. Never-notified categories are always due.
pub fn is_due(config: &ReminderConfig, now: DateTime<Utc>) -> bool {
    if !config.enabled {
        return false;
    }
    match config.last_notified_at {
        None => true,
        Some(last) => now - last > TimeDelta::minutes(i64::from(config.interval_minutes)),
    }
}

pub fn evaluate(settings: &WellnessSettings, now: &DateTime<FixedOffset>) -> Evaluation {
    let state = reminder_state(settings, now);
    if state != ReminderState::Active {
        return Evaluation::idle(state);
    }

    let instant = now.with_timezone(&Utc);
    let mut evaluation = Evaluation::idle(state);
    for category in ReminderCategory::ALL {
        let Some(config) = settings.reminder(category) else {
            continue;
        };
        if is_due(config, instant) {
            evaluation.fired.push(category);
            evaluation.updated_last_notified.insert(category, instant);
        }
    }
    evaluation
}

/// Instant at which a pause of `hours` started at `now` ends.
pub fn pause_until(now: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    let millis = (hours * 3_600_000.0).round();
    // Callers validate the duration; saturate anything that still overflows.
    TimeDelta::try_milliseconds(millis as i64)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
