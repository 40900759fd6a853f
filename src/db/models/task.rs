use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{optional_text, required_text, ValidationError};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Life area a task or to-do belongs to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkCategory {
    #[default]
    Personal,
    Work,
    Shopping,
    Health,
    Finance,
}

impl WorkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkCategory::Personal => "personal",
            WorkCategory::Work => "work",
            WorkCategory::Shopping => "shopping",
            WorkCategory::Health => "health",
            WorkCategory::Finance => "finance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: WorkCategory,
    pub important: bool,
    pub due_date: DateTime<Utc>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub category: WorkCategory,
    #[serde(default)]
    pub important: bool,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

impl NewTask {
    pub fn normalized(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: required_text("title", &self.title, TITLE_MAX_CHARS, "Task title is required")?,
            description: optional_text(
                "description",
                self.description.as_deref(),
                DESCRIPTION_MAX_CHARS,
            )?,
            ..self
        })
    }
}

/// Partial update. A blank `description` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<WorkCategory>,
    pub important: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let title = match self.title.as_deref() {
            Some(raw) => Some(required_text(
                "title",
                raw,
                TITLE_MAX_CHARS,
                "Task title is required",
            )?),
            None => None,
        };
        let description = match self.description.as_deref() {
            Some(raw) => Some(
                optional_text("description", Some(raw), DESCRIPTION_MAX_CHARS)?
                    .unwrap_or_default(),
            ),
            None => None,
        };
        Ok(Self {
            title,
            description,
            ..self
        })
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = (!description.is_empty()).then(|| description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(important) = self.important {
            task.important = important;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// Without a `limit` every matching task is returned on one page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub search: Option<String>,
}

impl TaskQuery {
    pub const MAX_LIMIT: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
            .filter(|l| *l > 0)
            .map(|l| l.min(Self::MAX_LIMIT))
    }

    /// Lowercased search term, if any.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub results: usize,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub tasks: Vec<Task>,
}
