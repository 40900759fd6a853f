use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{
        format_datetime, parse_datetime, parse_task_priority, parse_task_status,
        parse_work_category, to_u64, total_pages,
    },
    models::{NewTask, Task, TaskPage, TaskQuery, TaskUpdate},
};

const TASK_COLUMNS: &str = "id, user_id, title, description, status, priority, category,
    important, due_date, completed, created_at, updated_at";

/// Earliest due date first; among equal dates, high priority before low.
const TASK_ORDER: &str = "due_date ASC,
    CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END ASC,
    created_at ASC, rowid ASC";

fn row_to_task(row: &Row) -> Result<Task> {
    let status: String = row.get("status")?;
    let priority: String = row.get("priority")?;
    let category: String = row.get("category")?;
    let due_date: String = row.get("due_date")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Task {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: parse_task_status(&status)?,
        priority: parse_task_priority(&priority)?,
        category: parse_work_category(&category)?,
        important: row.get("important")?,
        due_date: parse_datetime(&due_date, "due_date")?,
        completed: row.get("completed")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn find_task(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"
    ))?;
    let mut rows = stmt.query(params![id, user_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_task(row)?)),
        None => Ok(None),
    }
}

fn store_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "UPDATE tasks
         SET title = ?1, description = ?2, status = ?3, priority = ?4, category = ?5,
             important = ?6, due_date = ?7, completed = ?8, updated_at = ?9
         WHERE id = ?10 AND user_id = ?11",
        params![
            task.title,
            task.description,
            task.status.as_str(),
            task.priority.as_str(),
            task.category.as_str(),
            task.important,
            format_datetime(&task.due_date),
            task.completed,
            format_datetime(&task.updated_at),
            task.id,
            task.user_id,
        ],
    )
    .context("failed to update task")?;
    Ok(())
}

impl Database {
    pub async fn insert_task(
        &self,
        user_id: &str,
        new: NewTask,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let task = Task {
            id: format!("tsk_{}", uuid::Uuid::new_v4()),
            user_id: user_id.to_string(),
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            category: new.category,
            important: new.important,
            due_date: new.due_date,
            completed: new.completed,
            created_at: now,
            updated_at: now,
        };

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO tasks (id, user_id, title, description, status, priority, category,
                                    important, due_date, completed, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    task.id,
                    task.user_id,
                    task.title,
                    task.description,
                    task.status.as_str(),
                    task.priority.as_str(),
                    task.category.as_str(),
                    task.important,
                    format_datetime(&task.due_date),
                    task.completed,
                    format_datetime(&task.created_at),
                    format_datetime(&task.updated_at),
                ],
            )
            .context("failed to insert task")?;
            Ok(task)
        })
        .await
    }

    /// Filters by status, priority and a case-insensitive search over title
    /// and description. Paginates only when the query carries a limit.
    pub async fn list_tasks(&self, user_id: &str, query: TaskQuery) -> Result<TaskPage> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut filters = vec!["user_id = ?".to_string()];
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];
            if let Some(status) = query.status {
                filters.push("status = ?".into());
                params_vec.push(Box::new(status.as_str()));
            }
            if let Some(priority) = query.priority {
                filters.push("priority = ?".into());
                params_vec.push(Box::new(priority.as_str()));
            }
            if let Some(term) = query.search_term() {
                filters.push(
                    "(instr(lower(title), ?) > 0 OR instr(lower(COALESCE(description, '')), ?) > 0)"
                        .into(),
                );
                params_vec.push(Box::new(term.clone()));
                params_vec.push(Box::new(term));
            }
            let where_clause = filters.join(" AND ");

            let count_params: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM tasks WHERE {where_clause}"),
                count_params.as_slice(),
                |row| row.get(0),
            )?;
            let total = to_u64(total, "task count")?;

            let page = query.page();
            let mut sql = format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE {where_clause} ORDER BY {TASK_ORDER}"
            );
            let pages = match query.limit() {
                Some(limit) => {
                    let offset = u64::from(page - 1) * u64::from(limit);
                    sql.push_str(" LIMIT ? OFFSET ?");
                    params_vec.push(Box::new(limit));
                    params_vec.push(Box::new(i64::try_from(offset).unwrap_or(i64::MAX)));
                    total_pages(total, u64::from(limit))
                }
                None => 1,
            };

            let page_params: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(page_params.as_slice())?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(row_to_task(row)?);
            }

            Ok(TaskPage {
                results: tasks.len(),
                total,
                page,
                total_pages: pages,
                tasks,
            })
        })
        .await
    }

    /// `None` if the task does not exist for this user.
    pub async fn update_task(
        &self,
        user_id: &str,
        id: &str,
        update: TaskUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let Some(mut task) = find_task(&tx, &user_id, &id)? else {
                return Ok(None);
            };
            update.apply(&mut task);
            task.updated_at = now;
            store_task(&tx, &task)?;
            tx.commit().context("failed to commit task update")?;
            Ok(Some(task))
        })
        .await
    }

    pub async fn delete_task(&self, user_id: &str, id: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.execute(move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )
                .context("failed to delete task")?;
            Ok(deleted > 0)
        })
        .await
    }
}
