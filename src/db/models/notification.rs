use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NotificationCategory {
    #[default]
    System,
    Task,
    Reminder,
    Message,
    Project,
    Wellness,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::System => "system",
            NotificationCategory::Task => "task",
            NotificationCategory::Reminder => "reminder",
            NotificationCategory::Message => "message",
            NotificationCategory::Project => "project",
            NotificationCategory::Wellness => "wellness",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub category: NotificationCategory,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client payload for creating a notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub category: NotificationCategory,
}

impl NewNotification {
    /// Trims title and message; both must be non-empty afterwards.
    pub fn normalized(self) -> Result<Self, super::ValidationError> {
        let title = self.title.trim().to_string();
        let message = self.message.trim().to_string();
        if title.is_empty() {
            return Err(super::ValidationError::new(
                "title",
                "A notification title is required",
            ));
        }
        if message.is_empty() {
            return Err(super::ValidationError::new(
                "message",
                "A notification message is required",
            ));
        }
        Ok(Self {
            title,
            message,
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub read: Option<bool>,
    pub category: Option<NotificationCategory>,
}

impl NotificationQuery {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub results: usize,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub read: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_notification_defaults_and_trims() {
        let parsed: NewNotification =
            serde_json::from_str(r#"{"title":"  Hello ","message":" world  "}"#).unwrap();
        let normalized = parsed.normalized().unwrap();
        assert_eq!(normalized.title, "Hello");
        assert_eq!(normalized.message, "world");
        assert_eq!(normalized.kind, NotificationKind::Info);
        assert_eq!(normalized.category, NotificationCategory::System);
    }

    #[test]
    fn blank_title_is_rejected() {
        let parsed: NewNotification =
            serde_json::from_str(r#"{"title":"   ","message":"body","type":"warning"}"#).unwrap();
        let err = parsed.normalized().unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn query_limits_are_clamped() {
        let query = NotificationQuery {
            page: Some(0),
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), NotificationQuery::MAX_LIMIT);
        assert_eq!(NotificationQuery::default().limit(), 20);
    }

    #[test]
    fn serializes_kind_as_type() {
        let now = Utc::now();
        let notification = Notification {
            id: "n1".into(),
            user_id: "u1".into(),
            title: "t".into(),
            message: "m".into(),
            kind: NotificationKind::Warning,
            category: NotificationCategory::Wellness,
            read: false,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["category"], "wellness");
        assert_eq!(json["userId"], "u1");
    }
}
