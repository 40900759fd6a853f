use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;

use crate::{
    db::models::{NewNotification, Notification, NotificationPage, NotificationQuery, NotificationStats},
    error::{AppError, AppResult},
    http::{json_body, success, CurrentUser, Envelope},
    log_debug, AppState,
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Serialize)]
pub struct NotificationData {
    pub notification: Notification,
}

#[derive(Debug, Serialize)]
pub struct UpdatedData {
    pub updated: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/mark-all-read", post(mark_all_read))
        .route("/stats", get(notification_stats))
        .route("/{id}", patch(mark_read).delete(delete_notification))
}

fn not_found() -> AppError {
    AppError::NotFound("Notification not found".into())
}

pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<NotificationQuery>, QueryRejection>,
) -> AppResult<Json<Envelope<NotificationPage>>> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let page = state.db.list_notifications(&user_id, query).await?;
    Ok(success(page))
}

pub async fn create_notification(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewNotification>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Envelope<NotificationData>>)> {
    let new = json_body(payload)?.normalized()?;
    let notification = state
        .db
        .insert_notification(&user_id, new, state.clock.now_utc())
        .await?;
    log_debug!("Created notification {} for user {user_id}", notification.id);
    Ok((StatusCode::CREATED, success(NotificationData { notification })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<NotificationData>>> {
    let notification = state
        .db
        .mark_notification_read(&user_id, &id, state.clock.now_utc())
        .await?
        .ok_or_else(not_found)?;
    Ok(success(NotificationData { notification }))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Envelope<UpdatedData>>> {
    let updated = state
        .db
        .mark_all_notifications_read(&user_id, state.clock.now_utc())
        .await?;
    Ok(success(UpdatedData { updated }))
}

pub async fn notification_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Envelope<NotificationStats>>> {
    Ok(success(state.db.notification_stats(&user_id).await?))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !state.db.delete_notification(&user_id, &id).await? {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
