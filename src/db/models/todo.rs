use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    task::{WorkCategory, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS},
    validation::{optional_text, required_text, ValidationError},
};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in-progress",
            TodoStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub category: WorkCategory,
    pub important: bool,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default)]
    pub category: WorkCategory,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTodo {
    pub fn normalized(self) -> Result<Self, ValidationError> {
        Ok(Self {
            title: required_text("title", &self.title, TITLE_MAX_CHARS, "Todo title is required")?,
            description: optional_text(
                "description",
                self.description.as_deref(),
                DESCRIPTION_MAX_CHARS,
            )?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TodoStatus>,
    pub category: Option<WorkCategory>,
    pub important: Option<bool>,
    pub completed: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TodoUpdate {
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let title = self
            .title
            .as_deref()
            .map(|raw| required_text("title", raw, TITLE_MAX_CHARS, "Todo title is required"))
            .transpose()?;
        let description = self
            .description
            .as_deref()
            .map(|raw| {
                optional_text("description", Some(raw), DESCRIPTION_MAX_CHARS)
                    .map(Option::unwrap_or_default)
            })
            .transpose()?;
        Ok(Self {
            title,
            description,
            ..self
        })
    }

    pub fn apply(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(description) = &self.description {
            todo.description = (!description.is_empty()).then(|| description.clone());
        }
        if let Some(status) = self.status {
            todo.status = status;
        }
        if let Some(category) = self.category {
            todo.category = category;
        }
        if let Some(important) = self.important {
            todo.important = important;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            todo.due_date = Some(due_date);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TodoStatus>,
    pub category: Option<WorkCategory>,
    pub search: Option<String>,
}

impl TodoQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
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
pub struct TodoPage {
    pub results: usize,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub todos: Vec<Todo>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TodoStats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
}
