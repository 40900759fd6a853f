use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_category, parse_datetime, parse_kind, to_u64, total_pages},
    models::{NewNotification, Notification, NotificationPage, NotificationQuery, NotificationStats},
};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, kind, category, read, created_at, updated_at";

fn row_to_notification(row: &Row) -> Result<Notification> {
    let kind: String = row.get("kind")?;
    let category: String = row.get("category")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Notification {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        message: row.get("message")?,
        kind: parse_kind(&kind)?,
        category: parse_category(&category)?,
        read: row.get("read")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn find_notification(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Notification>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1 AND user_id = ?2"
    ))?;
    let mut rows = stmt.query(params![id, user_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_notification(row)?)),
        None => Ok(None),
    }
}

/// Inserts a notification inside the caller's connection or transaction.
pub(crate) fn insert_notification_row(
    conn: &Connection,
    user_id: &str,
    new: &NewNotification,
    now: DateTime<Utc>,
) -> Result<Notification> {
    let notification = Notification {
        id: format!("ntf_{}", uuid::Uuid::new_v4()),
        user_id: user_id.to_string(),
        title: new.title.clone(),
        message: new.message.clone(),
        kind: new.kind,
        category: new.category,
        read: false,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO notifications (id, user_id, title, message, kind, category, read, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
        params![
            notification.id,
            notification.user_id,
            notification.title,
            notification.message,
            notification.kind.as_str(),
            notification.category.as_str(),
            format_datetime(&notification.created_at),
            format_datetime(&notification.updated_at),
        ],
    )
    .context("failed to insert notification")?;

    Ok(notification)
}

impl Database {
    pub async fn insert_notification(
        &self,
        user_id: &str,
        new: NewNotification,
        now: DateTime<Utc>,
    ) -> Result<Notification> {
        let user_id = user_id.to_string();
        self.execute(move |conn| insert_notification_row(conn, &user_id, &new, now))
            .await
    }

    /// Newest first, filtered by read state and category when given.
    pub async fn list_notifications(
        &self,
        user_id: &str,
        query: NotificationQuery,
    ) -> Result<NotificationPage> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut filters = vec!["user_id = ?"];
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];
            if let Some(read) = query.read {
                filters.push("read = ?");
                params_vec.push(Box::new(read));
            }
            if let Some(category) = query.category {
                filters.push("category = ?");
                params_vec.push(Box::new(category.as_str()));
            }
            let where_clause = filters.join(" AND ");

            let count_params: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM notifications WHERE {where_clause}"),
                count_params.as_slice(),
                |row| row.get(0),
            )?;
            let total = to_u64(total, "notification count")?;

            let page = query.page();
            let limit = query.limit();
            let offset = u64::from(page - 1) * u64::from(limit);
            params_vec.push(Box::new(limit));
            params_vec.push(Box::new(i64::try_from(offset).unwrap_or(i64::MAX)));

            let page_params: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE {where_clause}
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ? OFFSET ?"
            ))?;
            let mut rows = stmt.query(page_params.as_slice())?;
            let mut notifications = Vec::new();
            while let Some(row) = rows.next()? {
                notifications.push(row_to_notification(row)?);
            }

            Ok(NotificationPage {
                results: notifications.len(),
                total,
                page,
                total_pages: total_pages(total, u64::from(limit)),
                notifications,
            })
        })
        .await
    }

    /// Marks one notification read. `None` if it does not exist for this user.
    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Notification>> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.execute(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE notifications SET read = 1, updated_at = ?1 WHERE id = ?2 AND user_id = ?3",
                    params![format_datetime(&now), id, user_id],
                )
                .context("failed to mark notification read")?;
            if updated == 0 {
                return Ok(None);
            }
            find_notification(conn, &user_id, &id)
        })
        .await
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_notifications_read(&self, user_id: &str, now: DateTime<Utc>) -> Result<u64> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let updated = conn
                .execute(
                    "UPDATE notifications SET read = 1, updated_at = ?1 WHERE user_id = ?2 AND read = 0",
                    params![format_datetime(&now), user_id],
                )
                .context("failed to mark notifications read")?;
            Ok(updated as u64)
        })
        .await
    }

    /// Returns false when nothing was deleted.
    pub async fn delete_notification(&self, user_id: &str, id: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.execute(move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM notifications WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )
                .context("failed to delete notification")?;
            Ok(deleted > 0)
        })
        .await
    }

    pub async fn notification_stats(&self, user_id: &str) -> Result<NotificationStats> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let (total, read): (i64, Option<i64>) = conn
                .query_row(
                    "SELECT COUNT(*), SUM(read) FROM notifications WHERE user_id = ?1",
                    params![user_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .unwrap_or((0, None));
            let total = to_u64(total, "total")?;
            let read = to_u64(read.unwrap_or(0), "read")?;
            Ok(NotificationStats {
                total,
                read,
                unread: total.saturating_sub(read),
            })
        })
        .await
    }
}
