//! Free-form personal reminders, separate from the wellness categories.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{optional_text, required_text, ValidationError};

pub const MESSAGE_MAX_CHARS: usize = 500;

/// How far ahead `upcoming=true` looks, in days.
pub const UPCOMING_DAYS: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub interval_minutes: u32,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub last_sent: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewReminder {
    pub message: String,
    pub interval_minutes: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl NewReminder {
    pub fn normalized(self) -> Result<Self, ValidationError> {
        if self.interval_minutes == 0 {
            return Err(ValidationError::new(
                "intervalMinutes",
                "must be at least 1 minute",
            ));
        }
        Ok(Self {
            message: required_text(
                "message",
                &self.message,
                MESSAGE_MAX_CHARS,
                "A reminder message is required",
            )?,
            category: optional_text("category", self.category.as_deref(), 50)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderQuery {
    /// Only reminders due between now and five days from now.
    pub upcoming: Option<bool>,
    pub category: Option<String>,
}

impl ReminderQuery {
    /// Inclusive due-date window for `upcoming`, if requested.
    pub fn due_window(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.upcoming
            .filter(|upcoming| *upcoming)
            .map(|_| (now, now + TimeDelta::days(UPCOMING_DAYS)))
    }
}
