use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, format_optional_datetime, parse_datetime, parse_optional_datetime},
    models::{NewReminder, Reminder, ReminderQuery},
};

const REMINDER_COLUMNS: &str =
    "id, user_id, message, interval_minutes, category, due_date, last_sent, created_at, updated_at";

fn row_to_reminder(row: &Row) -> Result<Reminder> {
    let interval: i64 = row.get("interval_minutes")?;
    let due_date: Option<String> = row.get("due_date")?;
    let last_sent: String = row.get("last_sent")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Reminder {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        message: row.get("message")?,
        interval_minutes: u32::try_from(interval)
            .with_context(|| format!("interval_minutes {interval} out of range"))?,
        category: row.get("category")?,
        due_date: parse_optional_datetime(due_date, "due_date")?,
        last_sent: parse_datetime(&last_sent, "last_sent")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    /// `lastSent` starts at `now`.
    pub async fn insert_reminder(
        &self,
        user_id: &str,
        new: NewReminder,
        now: DateTime<Utc>,
    ) -> Result<Reminder> {
        let reminder = Reminder {
            id: format!("rmd_{}", uuid::Uuid::new_v4()),
            user_id: user_id.to_string(),
            message: new.message,
            interval_minutes: new.interval_minutes,
            category: new.category,
            due_date: new.due_date,
            last_sent: now,
            created_at: now,
            updated_at: now,
        };

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO reminders (id, user_id, message, interval_minutes, category, due_date,
                                        last_sent, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    reminder.id,
                    reminder.user_id,
                    reminder.message,
                    reminder.interval_minutes,
                    reminder.category,
                    format_optional_datetime(reminder.due_date.as_ref()),
                    format_datetime(&reminder.last_sent),
                    format_datetime(&reminder.created_at),
                    format_datetime(&reminder.updated_at),
                ],
            )
            .context("failed to insert reminder")?;
            Ok(reminder)
        })
        .await
    }

    /// Soonest due first; reminders without a due date come last.
    pub async fn list_reminders(
        &self,
        user_id: &str,
        query: ReminderQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut filters = vec!["user_id = ?"];
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];
            if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                filters.push("category = ?");
                params_vec.push(Box::new(category.to_string()));
            }
            if let Some((from, to)) = query.due_window(now) {
                filters.push("due_date >= ? AND due_date <= ?");
                params_vec.push(Box::new(format_datetime(&from)));
                params_vec.push(Box::new(format_datetime(&to)));
            }

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let mut stmt = conn.prepare(&format!(
                "SELECT {REMINDER_COLUMNS} FROM reminders
                 WHERE {}
                 ORDER BY due_date IS NULL, due_date ASC, created_at ASC, rowid ASC",
                filters.join(" AND ")
            ))?;
            let mut rows = stmt.query(params_refs.as_slice())?;
            let mut reminders = Vec::new();
            while let Some(row) = rows.next()? {
                reminders.push(row_to_reminder(row)?);
            }
            Ok(reminders)
        })
        .await
    }

    /// Returns false when the reminder does not exist for this user.
    pub async fn delete_reminder(&self, user_id: &str, id: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.execute(move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM reminders WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )
                .context("failed to delete reminder")?;
            Ok(deleted > 0)
        })
        .await
    }
}
