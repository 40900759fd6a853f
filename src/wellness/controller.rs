use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    clock::Clock,
    db::{
        models::{validation, Notification, WellnessSettings, WellnessSettingsUpdate},
        Database,
    },
    error::AppResult,
    log_debug, log_info,
    wellness::evaluator,
};

const ENABLE_LOGS: bool = true;

pub const DEFAULT_PAUSE_HOURS: f64 = 1.0;

/// Result of a client poll.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub paused: bool,
    pub pause_until: Option<DateTime<Utc>>,
    pub outside_active_hours: bool,
    pub notifications: Vec<Notification>,
}

#[derive(Clone)]
pub struct WellnessController {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl WellnessController {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn get_settings(&self, user_id: &str) -> AppResult<WellnessSettings> {
        Ok(self
            .db
            .get_or_create_wellness_settings(user_id, self.clock.now_utc())
            .await?)
    }

    pub async fn update_settings(
        &self,
        user_id: &str,
        update: WellnessSettingsUpdate,
    ) -> AppResult<WellnessSettings> {
        let validated = validation::validate_update(&update)?;
        let settings = self
            .db
            .update_wellness_settings(user_id, validated, self.clock.now_utc())
            .await?;
        log_debug!("Updated wellness settings for user {user_id}");
        Ok(settings)
    }

    /// Suppresses reminders for `hours` (one hour when not given).
    pub async fn pause(&self, user_id: &str, hours: Option<f64>) -> AppResult<WellnessSettings> {
        let hours = hours.unwrap_or(DEFAULT_PAUSE_HOURS);
        validation::validate_pause_hours(hours)?;

        let now = self.clock.now_utc();
        let until = evaluator::pause_until(now, hours);
        let settings = self.db.set_wellness_pause(user_id, Some(until), now).await?;
        log_info!("Paused wellness reminders for user {user_id} until {until}");
        Ok(settings)
    }

    pub async fn resume(&self, user_id: &str) -> AppResult<WellnessSettings> {
        let settings = self
            .db
            .set_wellness_pause(user_id, None, self.clock.now_utc())
            .await?;
        log_info!("Resumed wellness reminders for user {user_id}");
        Ok(settings)
    }

    pub async fn reset_timers(&self, user_id: &str) -> AppResult<WellnessSettings> {
        let settings = self
            .db
            .reset_reminder_timers(user_id, self.clock.now_utc())
            .await?;
        log_info!("Reset reminder timers for user {user_id}");
        Ok(settings)
    }

    pub async fn check(&self, user_id: &str) -> AppResult<CheckOutcome> {
        let check = self.db.run_reminder_check(user_id, self.clock.now()).await?;
        let evaluation = check.evaluation;

        if !evaluation.fired.is_empty() {
            let fired: Vec<&str> = evaluation.fired.iter().map(|c| c.as_str()).collect();
            log_info!("Fired wellness reminders for user {user_id}: {}", fired.join(", "));
        }

        Ok(CheckOutcome {
            paused: evaluation.is_paused(),
            pause_until: evaluation.pause_until(),
            outside_active_hours: evaluation.is_outside_active_hours(),
            notifications: check.notifications,
        })
    }
}
