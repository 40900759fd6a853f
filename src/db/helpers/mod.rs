use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::db::models::{
    NotificationCategory, NotificationKind, TaskPriority, TaskStatus, TodoStatus, WorkCategory,
};

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn total_pages(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Fixed-width RFC 3339 so stored timestamps sort chronologically as text.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn format_optional_datetime(value: Option<&DateTime<Utc>>) -> Option<String> {
    value.map(format_datetime)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_kind(value: &str) -> Result<NotificationKind> {
    match value {
        "info" => Ok(NotificationKind::Info),
        "success" => Ok(NotificationKind::Success),
        "warning" => Ok(NotificationKind::Warning),
        "error" => Ok(NotificationKind::Error),
        other => Err(anyhow!("unknown notification type {other}")),
    }
}

pub fn parse_category(value: &str) -> Result<NotificationCategory> {
    match value {
        "system" => Ok(NotificationCategory::System),
        "task" => Ok(NotificationCategory::Task),
        "reminder" => Ok(NotificationCategory::Reminder),
        "message" => Ok(NotificationCategory::Message),
        "project" => Ok(NotificationCategory::Project),
        "wellness" => Ok(NotificationCategory::Wellness),
        other => Err(anyhow!("unknown notification category {other}")),
    }
}

pub fn parse_task_status(value: &str) -> Result<TaskStatus> {
    match value {
        "pending" => Ok(TaskStatus::Pending),
        "in-progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        "cancelled" => Ok(TaskStatus::Cancelled),
        other => Err(anyhow!("unknown task status {other}")),
    }
}

pub fn parse_task_priority(value: &str) -> Result<TaskPriority> {
    match value {
        "low" => Ok(TaskPriority::Low),
        "medium" => Ok(TaskPriority::Medium),
        "high" => Ok(TaskPriority::High),
        other => Err(anyhow!("unknown task priority {other}")),
    }
}

pub fn parse_todo_status(value: &str) -> Result<TodoStatus> {
    match value {
        "pending" => Ok(TodoStatus::Pending),
        "in-progress" => Ok(TodoStatus::InProgress),
        "completed" => Ok(TodoStatus::Completed),
        other => Err(anyhow!("unknown todo status {other}")),
    }
}

pub fn parse_work_category(value: &str) -> Result<WorkCategory> {
    match value {
        "personal" => Ok(WorkCategory::Personal),
        "work" => Ok(WorkCategory::Work),
        "shopping" => Ok(WorkCategory::Shopping),
        "health" => Ok(WorkCategory::Health),
        "finance" => Ok(WorkCategory::Finance),
        other => Err(anyhow!("unknown category {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formatted_timestamps_round_trip_and_sort() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let late = early + chrono::TimeDelta::microseconds(1500);
        let (a, b) = (format_datetime(&early), format_datetime(&late));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_datetime(&a, "ts").unwrap(), early);
    }

    #[test]
    fn unknown_enum_values_are_errors() {
        assert!(parse_kind("loud").is_err());
        assert!(parse_category("chores").is_err());
        assert_eq!(parse_category("wellness").unwrap(), NotificationCategory::Wellness);
        assert_eq!(parse_task_status("in-progress").unwrap(), TaskStatus::InProgress);
        assert!(parse_todo_status("cancelled").is_err());
        assert!(parse_work_category("hobby").is_err());
    }

    #[test]
    fn page_counts_round_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 0);
    }
}
