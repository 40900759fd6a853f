use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;

use crate::{
    db::models::{NewTask, Task, TaskPage, TaskQuery, TaskUpdate},
    error::{AppError, AppResult},
    http::{json_body, success, CurrentUser, Envelope},
    log_debug, AppState,
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Serialize)]
pub struct TaskData {
    pub task: Task,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/{id}", put(update_task).delete(delete_task))
}

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> AppResult<Json<Envelope<TaskPage>>> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(success(state.db.list_tasks(&user_id, query).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<TaskData>>)> {
    let new = json_body(payload)?.normalized()?;
    let task = state
        .db
        .insert_task(&user_id, new, state.clock.now_utc())
        .await?;
    log_debug!("Created task {} for user {user_id}", task.id);
    Ok((StatusCode::CREATED, success(TaskData { task })))
}

pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<TaskUpdate>, JsonRejection>,
) -> AppResult<Json<Envelope<TaskData>>> {
    let update = json_body(payload)?.normalized()?;
    let task = state
        .db
        .update_task(&user_id, &id, update, state.clock.now_utc())
        .await?
        .ok_or_else(not_found)?;
    Ok(success(TaskData { task }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !state.db.delete_task(&user_id, &id).await? {
        return Err(not_found());
    }
    log_debug!("Deleted task {id} for user {user_id}");
    Ok(StatusCode::NO_CONTENT)
}
