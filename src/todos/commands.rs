use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Serialize;

use crate::{
    db::models::{NewTodo, Todo, TodoPage, TodoQuery, TodoStats, TodoUpdate},
    error::{AppError, AppResult},
    http::{json_body, success, CurrentUser, Envelope},
    log_debug, AppState,
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Serialize)]
pub struct TodoData {
    pub todo: Todo,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/stats", get(todo_stats))
        .route("/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/{id}/toggle", patch(toggle_todo))
}

fn not_found() -> AppError {
    AppError::NotFound("Todo not found".into())
}

pub async fn list_todos(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<TodoQuery>, QueryRejection>,
) -> AppResult<Json<Envelope<TodoPage>>> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(success(state.db.list_todos(&user_id, query).await?))
}

pub async fn create_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewTodo>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<TodoData>>)> {
    let new = json_body(payload)?.normalized()?;
    let todo = state
        .db
        .insert_todo(&user_id, new, state.clock.now_utc())
        .await?;
    log_debug!("Created todo {} for user {user_id}", todo.id);
    Ok((StatusCode::CREATED, success(TodoData { todo })))
}

pub async fn get_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<TodoData>>> {
    let todo = state
        .db
        .get_todo(&user_id, &id)
        .await?
        .ok_or_else(not_found)?;
    Ok(success(TodoData { todo }))
}

pub async fn update_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<TodoUpdate>, JsonRejection>,
) -> AppResult<Json<Envelope<TodoData>>> {
    let update = json_body(payload)?.normalized()?;
    let todo = state
        .db
        .update_todo(&user_id, &id, update, state.clock.now_utc())
        .await?
        .ok_or_else(not_found)?;
    Ok(success(TodoData { todo }))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<TodoData>>> {
    let todo = state
        .db
        .toggle_todo(&user_id, &id, state.clock.now_utc())
        .await?
        .ok_or_else(not_found)?;
    Ok(success(TodoData { todo }))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !state.db.delete_todo(&user_id, &id).await? {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn todo_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Envelope<TodoStats>>> {
    Ok(success(state.db.todo_stats(&user_id).await?))
}
