use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{params, Connection, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{format_datetime, format_optional_datetime, parse_datetime, parse_optional_datetime},
        models::{
            wellness::ValidatedSettingsUpdate, ActiveHours, ClockTime, NewNotification,
            Notification, NotificationCategory, NotificationKind, ReminderCategory,
            ReminderConfig, WellnessSettings,
        },
        repositories::notifications::insert_notification_row,
    },
    log_info, log_warn,
    wellness::evaluator::{evaluate, Evaluation},
};

const ENABLE_LOGS: bool = true;

const SETTINGS_COLUMNS: &str = "user_id,
    water_enabled, water_interval_minutes, water_last_notified_at,
    eye_break_enabled, eye_break_interval_minutes, eye_break_last_notified_at,
    posture_enabled, posture_interval_minutes, posture_last_notified_at,
    active_start, active_end, pause_until, created_at, updated_at";

/// Outcome of a reminder check: the evaluation and the notifications it created.
#[derive(Debug, Clone)]
pub struct ReminderCheck {
    pub evaluation: Evaluation,
    pub notifications: Vec<Notification>,
}

fn column_prefix(category: ReminderCategory) -> &'static str {
    match category {
        ReminderCategory::Water => "water",
        ReminderCategory::EyeBreak => "eye_break",
        ReminderCategory::Posture => "posture",
    }
}

/// Reads one category. Anything unreadable or out of bounds yields `None`,
/// which the evaluator treats as a category that never fires.
fn reminder_from_row(row: &Row, user_id: &str, category: ReminderCategory) -> Option<ReminderConfig> {
    let prefix = column_prefix(category);
    let read = || -> Result<ReminderConfig> {
        let enabled: Option<bool> = row.get(format!("{prefix}_enabled").as_str())?;
        let interval: Option<i64> = row.get(format!("{prefix}_interval_minutes").as_str())?;
        let last: Option<String> = row.get(format!("{prefix}_last_notified_at").as_str())?;

        let enabled = enabled.ok_or_else(|| anyhow!("enabled flag is missing"))?;
        let interval_minutes = interval
            .and_then(|value| u32::try_from(value).ok())
            .filter(|minutes| category.accepts_interval(*minutes))
            .ok_or_else(|| anyhow!("interval {interval:?} is out of bounds"))?;
        let last_notified_at = parse_optional_datetime(last, "last_notified_at")?;

        Ok(ReminderConfig {
            enabled,
            interval_minutes,
            last_notified_at,
        })
    };

    match read() {
        Ok(config) => Some(config),
        Err(err) => {
            log_warn!(
                "Ignoring unreadable {} reminder for user {user_id}: {err:#}",
                category.as_str()
            );
            None
        }
    }
}

fn row_to_settings(row: &Row) -> Result<WellnessSettings> {
    let user_id: String = row.get("user_id")?;
    let active_start: String = row.get("active_start")?;
    let active_end: String = row.get("active_end")?;
    let pause_until: Option<String> = row.get("pause_until")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    let active_hours = ActiveHours {
        start: active_start
            .parse::<ClockTime>()
            .with_context(|| format!("corrupt active_start for user {user_id}"))?,
        end: active_end
            .parse::<ClockTime>()
            .with_context(|| format!("corrupt active_end for user {user_id}"))?,
    };

    Ok(WellnessSettings {
        water_reminder: reminder_from_row(row, &user_id, ReminderCategory::Water),
        eye_break_reminder: reminder_from_row(row, &user_id, ReminderCategory::EyeBreak),
        posture_reminder: reminder_from_row(row, &user_id, ReminderCategory::Posture),
        active_hours,
        pause_until: parse_optional_datetime(pause_until, "pause_until")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
        user_id,
    })
}

/// Inserts the default row unless one exists. Safe to race: the primary key
/// turns a second insert into a no-op instead of a duplicate.
fn ensure_settings(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<()> {
    let defaults = WellnessSettings::with_defaults(user_id, now);
    let water = ReminderConfig::with_defaults(ReminderCategory::Water);
    let eye = ReminderConfig::with_defaults(ReminderCategory::EyeBreak);
    let posture = ReminderConfig::with_defaults(ReminderCategory::Posture);
    let inserted = conn
        .execute(
            "INSERT INTO wellness_settings (
                 user_id,
                 water_enabled, water_interval_minutes,
                 eye_break_enabled, eye_break_interval_minutes,
                 posture_enabled, posture_interval_minutes,
                 active_start, active_end, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(user_id) DO NOTHING",
            params![
                user_id,
                water.enabled,
                water.interval_minutes,
                eye.enabled,
                eye.interval_minutes,
                posture.enabled,
                posture.interval_minutes,
                defaults.active_hours.start.to_string(),
                defaults.active_hours.end.to_string(),
                format_datetime(&now),
                format_datetime(&now),
            ],
        )
        .context("failed to create default wellness settings")?;

    if inserted > 0 {
        log_info!("Created default wellness settings for user {user_id}");
    }
    Ok(())
}

fn load_settings(conn: &Connection, user_id: &str) -> Result<WellnessSettings> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SETTINGS_COLUMNS} FROM wellness_settings WHERE user_id = ?1"
    ))?;
    let mut rows = stmt.query(params![user_id])?;
    match rows.next()? {
        Some(row) => row_to_settings(row),
        None => Err(anyhow!("wellness settings missing for user {user_id}")),
    }
}

fn get_or_create(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<WellnessSettings> {
    ensure_settings(conn, user_id, now)?;
    load_settings(conn, user_id)
}

/// Writes every mutable column. Categories that could not be read stay untouched.
fn store_settings(conn: &Connection, settings: &WellnessSettings) -> Result<()> {
    for category in ReminderCategory::ALL {
        let Some(config) = settings.reminder(category) else {
            continue;
        };
        let prefix = column_prefix(category);
        conn.execute(
            &format!(
                "UPDATE wellness_settings
                 SET {prefix}_enabled = ?1,
                     {prefix}_interval_minutes = ?2,
                     {prefix}_last_notified_at = ?3
                 WHERE user_id = ?4"
            ),
            params![
                config.enabled,
                config.interval_minutes,
                format_optional_datetime(config.last_notified_at.as_ref()),
                settings.user_id,
            ],
        )
        .with_context(|| format!("failed to store {} reminder", category.as_str()))?;
    }

    conn.execute(
        "UPDATE wellness_settings
         SET active_start = ?1,
             active_end = ?2,
             pause_until = ?3,
             updated_at = ?4
         WHERE user_id = ?5",
        params![
            settings.active_hours.start.to_string(),
            settings.active_hours.end.to_string(),
            format_optional_datetime(settings.pause_until.as_ref()),
            format_datetime(&settings.updated_at),
            settings.user_id,
        ],
    )
    .context("failed to store wellness settings")?;
    Ok(())
}

/// Records fired categories in one statement, guarded by the values the
/// evaluation was based on. Returns false if another writer got there first.
fn commit_last_notified(
    conn: &Connection,
    settings: &WellnessSettings,
    evaluation: &Evaluation,
    now: DateTime<Utc>,
) -> Result<bool> {
    let mut assignments = Vec::new();
    let mut guards = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    for (category, stamp) in &evaluation.updated_last_notified {
        assignments.push(format!("{}_last_notified_at = ?", column_prefix(*category)));
        params_vec.push(Box::new(format_datetime(stamp)));
    }
    assignments.push("updated_at = ?".to_string());
    params_vec.push(Box::new(format_datetime(&now)));

    params_vec.push(Box::new(settings.user_id.clone()));
    for category in evaluation.updated_last_notified.keys() {
        let previous = settings
            .reminder(*category)
            .and_then(|config| config.last_notified_at.as_ref());
        guards.push(format!("{}_last_notified_at IS ?", column_prefix(*category)));
        params_vec.push(Box::new(format_optional_datetime(previous)));
    }

    let mut query = format!(
        "UPDATE wellness_settings SET {} WHERE user_id = ?",
        assignments.join(", ")
    );
    for guard in &guards {
        query.push_str(" AND ");
        query.push_str(guard);
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    let rows_affected = conn
        .execute(&query, params_refs.as_slice())
        .context("failed to record reminder timestamps")?;
    Ok(rows_affected == 1)
}

impl Database {
    /// Returns the user's settings, creating the default row on first access.
    pub async fn get_or_create_wellness_settings(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<WellnessSettings> {
        let user_id = user_id.to_string();
        self.execute(move |conn| get_or_create(conn, &user_id, now)).await
    }

    pub async fn update_wellness_settings(
        &self,
        user_id: &str,
        update: ValidatedSettingsUpdate,
        now: DateTime<Utc>,
    ) -> Result<WellnessSettings> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let mut settings = get_or_create(&tx, &user_id, now)?;
            update.apply(&mut settings);
            settings.updated_at = now;
            store_settings(&tx, &settings)?;
            tx.commit().context("failed to commit settings update")?;
            Ok(settings)
        })
        .await
    }

    /// Sets or clears the pause window.
    pub async fn set_wellness_pause(
        &self,
        user_id: &str,
        pause_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<WellnessSettings> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            ensure_settings(&tx, &user_id, now)?;
            tx.execute(
                "UPDATE wellness_settings SET pause_until = ?1, updated_at = ?2 WHERE user_id = ?3",
                params![
                    format_optional_datetime(pause_until.as_ref()),
                    format_datetime(&now),
                    user_id,
                ],
            )
            .context("failed to update pause window")?;
            let settings = load_settings(&tx, &user_id)?;
            tx.commit().context("failed to commit pause update")?;
            Ok(settings)
        })
        .await
    }

    /// Clears every `last_notified_at`, so all enabled categories are due again.
    pub async fn reset_reminder_timers(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<WellnessSettings> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            ensure_settings(&tx, &user_id, now)?;
            tx.execute(
                "UPDATE wellness_settings
                 SET water_last_notified_at = NULL,
                     eye_break_last_notified_at = NULL,
                     posture_last_notified_at = NULL,
                     updated_at = ?1
                 WHERE user_id = ?2",
                params![format_datetime(&now), user_id],
            )
            .context("failed to reset reminder timers")?;
            let settings = load_settings(&tx, &user_id)?;
            tx.commit().context("failed to commit timer reset")?;
            Ok(settings)
        })
        .await
    }

    /// Evaluates the user's reminders at `now` and commits the result.
    ///
    /// Loading, evaluating, creating notifications and recording timestamps
    /// happen in one transaction on the database thread, so two overlapping
    /// checks for the same user cannot both fire the same reminder.
    pub async fn run_reminder_check(
        &self,
        user_id: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<ReminderCheck> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let instant = now.with_timezone(&Utc);
            let tx = conn.transaction()?;
            let settings = get_or_create(&tx, &user_id, instant)?;
            let mut evaluation = evaluate(&settings, &now);

            if evaluation.fired.is_empty() {
                tx.commit()?;
                return Ok(ReminderCheck {
                    evaluation,
                    notifications: Vec::new(),
                });
            }

            if !commit_last_notified(&tx, &settings, &evaluation, instant)? {
                log_warn!("Reminder bookkeeping for user {user_id} changed during check; skipping");
                tx.rollback()?;
                evaluation.fired.clear();
                evaluation.updated_last_notified.clear();
                return Ok(ReminderCheck {
                    evaluation,
                    notifications: Vec::new(),
                });
            }

            let mut notifications = Vec::with_capacity(evaluation.fired.len());
            for category in &evaluation.fired {
                let (title, message) = category.notification_copy();
                let new = NewNotification {
                    title: title.to_string(),
                    message: message.to_string(),
                    kind: NotificationKind::Info,
                    category: NotificationCategory::Wellness,
                };
                notifications.push(insert_notification_row(&tx, &user_id, &new, instant)?);
            }

            tx.commit().context("failed to commit reminder check")?;
            Ok(ReminderCheck {
                evaluation,
                notifications,
            })
        })
        .await
    }
}
