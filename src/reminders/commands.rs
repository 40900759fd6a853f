use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;

use crate::{
    db::models::{NewReminder, Reminder, ReminderQuery},
    error::{AppError, AppResult},
    http::{json_body, success, success_with_message, CurrentUser, Envelope},
    log_debug, AppState,
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Serialize)]
pub struct ReminderData {
    pub reminder: Reminder,
}

#[derive(Debug, Serialize)]
pub struct ReminderList {
    pub reminders: Vec<Reminder>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reminders).post(create_reminder))
        .route("/{id}", delete(delete_reminder))
}

/// `?upcoming=true` narrows to reminders due within the next five days.
pub async fn list_reminders(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<ReminderQuery>, QueryRejection>,
) -> AppResult<Json<Envelope<ReminderList>>> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let reminders = state
        .db
        .list_reminders(&user_id, query, state.clock.now_utc())
        .await?;
    Ok(success(ReminderList { reminders }))
}

pub async fn create_reminder(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewReminder>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<ReminderData>>)> {
    let new = json_body(payload)?.normalized()?;
    let reminder = state
        .db
        .insert_reminder(&user_id, new, state.clock.now_utc())
        .await?;
    log_debug!("Created reminder {} for user {user_id}", reminder.id);
    Ok((
        StatusCode::CREATED,
        success_with_message("Reminder created successfully", ReminderData { reminder }),
    ))
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !state.db.delete_reminder(&user_id, &id).await? {
        return Err(AppError::NotFound("Reminder not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
