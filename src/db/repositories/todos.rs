use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{
        format_datetime, format_optional_datetime, parse_datetime, parse_optional_datetime,
        parse_todo_status, parse_work_category, to_u64, total_pages,
    },
    models::{NewTodo, Todo, TodoPage, TodoQuery, TodoStats, TodoStatus, TodoUpdate},
};

const TODO_COLUMNS: &str = "id, user_id, title, description, status, category, important,
    completed, due_date, created_at, updated_at";

fn row_to_todo(row: &Row) -> Result<Todo> {
    let status: String = row.get("status")?;
    let category: String = row.get("category")?;
    let due_date: Option<String> = row.get("due_date")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Todo {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: parse_todo_status(&status)?,
        category: parse_work_category(&category)?,
        important: row.get("important")?,
        completed: row.get("completed")?,
        due_date: parse_optional_datetime(due_date, "due_date")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn find_todo(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Todo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1 AND user_id = ?2"
    ))?;
    let mut rows = stmt.query(params![id, user_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_todo(row)?)),
        None => Ok(None),
    }
}

fn store_todo(conn: &Connection, todo: &Todo) -> Result<()> {
    conn.execute(
        "UPDATE todos
         SET title = ?1, description = ?2, status = ?3, category = ?4, important = ?5,
             completed = ?6, due_date = ?7, updated_at = ?8
         WHERE id = ?9 AND user_id = ?10",
        params![
            todo.title,
            todo.description,
            todo.status.as_str(),
            todo.category.as_str(),
            todo.important,
            todo.completed,
            format_optional_datetime(todo.due_date.as_ref()),
            format_datetime(&todo.updated_at),
            todo.id,
            todo.user_id,
        ],
    )
    .context("failed to update todo")?;
    Ok(())
}

/// Loads, mutates and stores one todo in a transaction. `None` if the todo
/// does not exist for this user.
fn modify_todo<F>(
    conn: &mut Connection,
    user_id: &str,
    id: &str,
    now: DateTime<Utc>,
    change: F,
) -> Result<Option<Todo>>
where
    F: FnOnce(&mut Todo),
{
    let tx = conn.transaction()?;
    let Some(mut todo) = find_todo(&tx, user_id, id)? else {
        return Ok(None);
    };
    change(&mut todo);
    todo.updated_at = now;
    store_todo(&tx, &todo)?;
    tx.commit().context("failed to commit todo update")?;
    Ok(Some(todo))
}

impl Database {
    pub async fn insert_todo(&self, user_id: &str, new: NewTodo, now: DateTime<Utc>) -> Result<Todo> {
        let todo = Todo {
            id: format!("todo_{}", uuid::Uuid::new_v4()),
            user_id: user_id.to_string(),
            title: new.title,
            description: new.description,
            status: new.status,
            category: new.category,
            important: new.important,
            completed: new.completed,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
        };

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO todos (id, user_id, title, description, status, category, important,
                                    completed, due_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    todo.id,
                    todo.user_id,
                    todo.title,
                    todo.description,
                    todo.status.as_str(),
                    todo.category.as_str(),
                    todo.important,
                    todo.completed,
                    format_optional_datetime(todo.due_date.as_ref()),
                    format_datetime(&todo.created_at),
                    format_datetime(&todo.updated_at),
                ],
            )
            .context("failed to insert todo")?;
            Ok(todo)
        })
        .await
    }

    /// Newest first.
    pub async fn list_todos(&self, user_id: &str, query: TodoQuery) -> Result<TodoPage> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut filters = vec!["user_id = ?"];
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];
            if let Some(status) = query.status {
                filters.push("status = ?");
                params_vec.push(Box::new(status.as_str()));
            }
            if let Some(category) = query.category {
                filters.push("category = ?");
                params_vec.push(Box::new(category.as_str()));
            }
            if let Some(term) = query.search_term() {
                filters.push(
                    "(instr(lower(title), ?) > 0 OR instr(lower(COALESCE(description, '')), ?) > 0)",
                );
                params_vec.push(Box::new(term.clone()));
                params_vec.push(Box::new(term));
            }
            let where_clause = filters.join(" AND ");

            let count_params: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM todos WHERE {where_clause}"),
                count_params.as_slice(),
                |row| row.get(0),
            )?;
            let total = to_u64(total, "todo count")?;

            let page = query.page();
            let limit = query.limit();
            let offset = u64::from(page - 1) * u64::from(limit);
            params_vec.push(Box::new(limit));
            params_vec.push(Box::new(i64::try_from(offset).unwrap_or(i64::MAX)));

            let page_params: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let mut stmt = conn.prepare(&format!(
                "SELECT {TODO_COLUMNS} FROM todos
                 WHERE {where_clause}
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ? OFFSET ?"
            ))?;
            let mut rows = stmt.query(page_params.as_slice())?;
            let mut todos = Vec::new();
            while let Some(row) = rows.next()? {
                todos.push(row_to_todo(row)?);
            }

            Ok(TodoPage {
                results: todos.len(),
                total,
                page,
                total_pages: total_pages(total, u64::from(limit)),
                todos,
            })
        })
        .await
    }

    pub async fn get_todo(&self, user_id: &str, id: &str) -> Result<Option<Todo>> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.execute(move |conn| find_todo(conn, &user_id, &id)).await
    }

    pub async fn update_todo(
        &self,
        user_id: &str,
        id: &str,
        update: TodoUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Todo>> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.execute(move |conn| modify_todo(conn, &user_id, &id, now, |todo| update.apply(todo)))
            .await
    }

    /// Flips `completed` and moves the status along with it.
    pub async fn toggle_todo(&self, user_id: &str, id: &str, now: DateTime<Utc>) -> Result<Option<Todo>> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.execute(move |conn| {
            modify_todo(conn, &user_id, &id, now, |todo| {
                todo.completed = !todo.completed;
                todo.status = if todo.completed {
                    TodoStatus::Completed
                } else {
                    TodoStatus::Pending
                };
            })
        })
        .await
    }

    pub async fn delete_todo(&self, user_id: &str, id: &str) -> Result<bool> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.execute(move |conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM todos WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )
                .context("failed to delete todo")?;
            Ok(deleted > 0)
        })
        .await
    }

    pub async fn todo_stats(&self, user_id: &str) -> Result<TodoStats> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let (total, completed): (i64, Option<i64>) = conn.query_row(
                "SELECT COUNT(*), SUM(completed) FROM todos WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let total = to_u64(total, "total")?;
            let completed = to_u64(completed.unwrap_or(0), "completed")?;
            Ok(TodoStats {
                total,
                completed,
                pending: total.saturating_sub(completed),
            })
        })
        .await
    }
}
