//! Wellness reminder settings.
//!
//! One `WellnessSettings` row exists per user. It is created lazily with
//! defaults on first access and mutated by settings updates, pause/resume,
//! reminder firing and timer resets.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ReminderCategory {
    Water,
    EyeBreak,
    Posture,
}

impl ReminderCategory {
    pub const ALL: [ReminderCategory; 3] = [
        ReminderCategory::Water,
        ReminderCategory::EyeBreak,
        ReminderCategory::Posture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderCategory::Water => "water",
            ReminderCategory::EyeBreak => "eyeBreak",
            ReminderCategory::Posture => "posture",
        }
    }

    /// Name of the settings field holding this category, as seen by clients.
    pub fn field_name(&self) -> &'static str {
        match self {
            ReminderCategory::Water => "waterReminder",
            ReminderCategory::EyeBreak => "eyeBreakReminder",
            ReminderCategory::Posture => "postureReminder",
        }
    }

    /// Inclusive bounds for `intervalMinutes`.
    pub fn interval_bounds(&self) -> (u32, u32) {
        match self {
            ReminderCategory::Water => (5, 240),
            ReminderCategory::EyeBreak => (5, 60),
            ReminderCategory::Posture => (5, 120),
        }
    }

    pub fn default_interval_minutes(&self) -> u32 {
        match self {
            ReminderCategory::Water => 120,
            ReminderCategory::EyeBreak => 20,
            ReminderCategory::Posture => 45,
        }
    }

    pub fn accepts_interval(&self, minutes: u32) -> bool {
        let (min, max) = self.interval_bounds();
        (min..=max).contains(&minutes)
    }

    /// Title and message of the notification created when this category fires.
    pub fn notification_copy(&self) -> (&'static str, &'static str) {
        match self {
            ReminderCategory::Water => (
                "Hydration Reminder",
                "It's time to drink water! Staying hydrated improves focus and overall health.",
            ),
            ReminderCategory::EyeBreak => (
                "20-20-20 Eye Break",
                "Look away at something 20 feet away for 20 seconds. This helps reduce eye strain.",
            ),
            ReminderCategory::Posture => (
                "Posture Check",
                "Check your posture! Sit up straight, relax your shoulders, and keep your feet flat on the floor.",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderConfig {
    pub enabled: bool,
    pub interval_minutes: u32,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl ReminderConfig {
    pub fn with_defaults(category: ReminderCategory) -> Self {
        Self {
            enabled: true,
            interval_minutes: category.default_interval_minutes(),
            last_notified_at: None,
        }
    }
}

/// Wall-clock time of day with minute precision, `00:00` through `24:00`.
///
/// Ordering matches the lexicographic ordering of the zero-padded `HH:MM`
/// form, so `24:00` sorts after every real minute of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const END_OF_DAY: ClockTime = ClockTime(24 * 60);

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        match (hour, minute) {
            (24, 0) => Some(Self::END_OF_DAY),
            (0..=23, 0..=59) => u16::try_from(hour * 60 + minute).ok().map(Self),
            _ => None,
        }
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid HH:MM time")]
pub struct ClockTimeParseError(pub String);

impl FromStr for ClockTime {
    type Err = ClockTimeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ClockTimeParseError(value.to_string());
        let bytes = value.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let (hh, mm) = (&value[0..2], &value[3..5]);
        if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u32 = hh.parse().map_err(|_| invalid())?;
        let minute: u32 = mm.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHours {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl Default for ActiveHours {
    fn default() -> Self {
        Self {
            start: ClockTime::MIDNIGHT,
            end: ClockTime::END_OF_DAY,
        }
    }
}

impl ActiveHours {
    /// Whether `time` falls inside the window, both ends inclusive.
    ///
    /// A window whose start is later than its end wraps past midnight, so
    /// `22:00`-`06:00` covers late evening and early morning.
    pub fn contains(&self, time: ClockTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessSettings {
    pub user_id: String,
    /// `None` only when the stored category is unreadable; such a category never fires.
    pub water_reminder: Option<ReminderConfig>,
    pub eye_break_reminder: Option<ReminderConfig>,
    pub posture_reminder: Option<ReminderConfig>,
    pub active_hours: ActiveHours,
    pub pause_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WellnessSettings {
    pub fn with_defaults(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            water_reminder: Some(ReminderConfig::with_defaults(ReminderCategory::Water)),
            eye_break_reminder: Some(ReminderConfig::with_defaults(ReminderCategory::EyeBreak)),
            posture_reminder: Some(ReminderConfig::with_defaults(ReminderCategory::Posture)),
            active_hours: ActiveHours::default(),
            pause_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reminder(&self, category: ReminderCategory) -> Option<&ReminderConfig> {
        match category {
            ReminderCategory::Water => self.water_reminder.as_ref(),
            ReminderCategory::EyeBreak => self.eye_break_reminder.as_ref(),
            ReminderCategory::Posture => self.posture_reminder.as_ref(),
        }
    }

    pub fn reminder_mut(&mut self, category: ReminderCategory) -> Option<&mut ReminderConfig> {
        match category {
            ReminderCategory::Water => self.water_reminder.as_mut(),
            ReminderCategory::EyeBreak => self.eye_break_reminder.as_mut(),
            ReminderCategory::Posture => self.posture_reminder.as_mut(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReminderUpdate {
    pub enabled: Option<bool>,
    pub interval_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActiveHoursUpdate {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Partial settings update accepted from clients.
///
/// Bookkeeping fields (`lastNotifiedAt`, `pauseUntil`) are not part of it;
/// they change only through firing, pause/resume and reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WellnessSettingsUpdate {
    pub water_reminder: Option<ReminderUpdate>,
    pub eye_break_reminder: Option<ReminderUpdate>,
    pub posture_reminder: Option<ReminderUpdate>,
    pub active_hours: Option<ActiveHoursUpdate>,
}

impl WellnessSettingsUpdate {
    pub fn reminder(&self, category: ReminderCategory) -> Option<&ReminderUpdate> {
        match category {
            ReminderCategory::Water => self.water_reminder.as_ref(),
            ReminderCategory::EyeBreak => self.eye_break_reminder.as_ref(),
            ReminderCategory::Posture => self.posture_reminder.as_ref(),
        }
    }
}

/// A settings update that passed validation and can be applied blindly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedSettingsUpdate {
    pub reminders: Vec<(ReminderCategory, ReminderUpdate)>,
    pub active_start: Option<ClockTime>,
    pub active_end: Option<ClockTime>,
}

impl ValidatedSettingsUpdate {
    pub fn apply(&self, settings: &mut WellnessSettings) {
        for (category, update) in &self.reminders {
            let slot = match category {
                ReminderCategory::Water => &mut settings.water_reminder,
                ReminderCategory::EyeBreak => &mut settings.eye_break_reminder,
                ReminderCategory::Posture => &mut settings.posture_reminder,
            };
            // An unreadable category is rebuilt from defaults before the update lands.
            let config = slot.get_or_insert_with(|| ReminderConfig::with_defaults(*category));
            if let Some(enabled) = update.enabled {
                config.enabled = enabled;
            }
            if let Some(minutes) = update.interval_minutes {
                config.interval_minutes = minutes;
            }
        }
        if let Some(start) = self.active_start {
            settings.active_hours.start = start;
        }
        if let Some(end) = self.active_end {
            settings.active_hours.end = end;
        }
    }
}

/// Validation for client-supplied payloads.
pub mod validation {
    use super::{ClockTime, ReminderCategory, ValidatedSettingsUpdate, WellnessSettingsUpdate};

    /// Longest pause a user may request, in hours.
    pub const MAX_PAUSE_HOURS: f64 = 720.0;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("{field}: {message}")]
    pub struct ValidationError {
        pub field: String,
        pub message: String,
    }

    impl ValidationError {
        pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
            Self {
                field: field.into(),
                message: message.into(),
            }
        }
    }

    /// Trims `value`; it must be non-empty and at most `max_chars` long.
    pub fn required_text(
        field: &str,
        value: &str,
        max_chars: usize,
        missing: &str,
    ) -> Result<String, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new(field, missing));
        }
        check_length(field, trimmed, max_chars)?;
        Ok(trimmed.to_string())
    }

    /// Trims `value`; blank text becomes `None`.
    pub fn optional_text(
        field: &str,
        value: Option<&str>,
        max_chars: usize,
    ) -> Result<Option<String>, ValidationError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(trimmed) => {
                check_length(field, trimmed, max_chars)?;
                Ok(Some(trimmed.to_string()))
            }
            None => Ok(None),
        }
    }

    fn check_length(field: &str, value: &str, max_chars: usize) -> Result<(), ValidationError> {
        if value.chars().count() > max_chars {
            return Err(ValidationError::new(
                field,
                format!("must be at most {max_chars} characters"),
            ));
        }
        Ok(())
    }

    pub fn validate_interval(category: ReminderCategory, minutes: u32) -> Result<(), ValidationError> {
        if category.accepts_interval(minutes) {
            return Ok(());
        }
        let (min, max) = category.interval_bounds();
        Err(ValidationError::new(
            format!("{}.intervalMinutes", category.field_name()),
            format!("must be between {min} and {max} minutes, got {minutes}"),
        ))
    }

    pub fn validate_clock_time(field: &str, value: &str) -> Result<ClockTime, ValidationError> {
        value
            .parse()
            .map_err(|_| ValidationError::new(field, format!("'{value}' is not a valid HH:MM time")))
    }

    pub fn validate_pause_hours(hours: f64) -> Result<(), ValidationError> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(ValidationError::new("duration", "must be a positive number of hours"));
        }
        if hours > MAX_PAUSE_HOURS {
            return Err(ValidationError::new(
                "duration",
                format!("must not exceed {MAX_PAUSE_HOURS} hours"),
            ));
        }
        Ok(())
    }

    pub fn validate_update(
        update: &WellnessSettingsUpdate,
    ) -> Result<ValidatedSettingsUpdate, ValidationError> {
        let mut validated = ValidatedSettingsUpdate::default();

        for category in ReminderCategory::ALL {
            if let Some(reminder) = update.reminder(category) {
                if let Some(minutes) = reminder.interval_minutes {
                    validate_interval(category, minutes)?;
                }
                validated.reminders.push((category, reminder.clone()));
            }
        }

        if let Some(hours) = &update.active_hours {
            validated.active_start = hours
                .start
                .as_deref()
                .map(|raw| validate_clock_time("activeHours.start", raw))
                .transpose()?;
            validated.active_end = hours
                .end
                .as_deref()
                .map(|raw| validate_clock_time("activeHours.end", raw))
                .transpose()?;
        }

        Ok(validated)
    }
}
