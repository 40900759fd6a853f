use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{WellnessSettings, WellnessSettingsUpdate},
    error::{AppError, AppResult},
    http::{json_body, success, success_with_message, CurrentUser, Envelope},
    wellness::controller::{CheckOutcome, DEFAULT_PAUSE_HOURS},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct SettingsData {
    pub settings: WellnessSettings,
}

/// Settings plus a human-readable confirmation.
#[derive(Debug, Serialize)]
pub struct PauseStateData {
    pub settings: WellnessSettings,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PauseRequest {
    /// Hours; fractional values are allowed.
    pub duration: Option<f64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).patch(update_settings))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/check-notifications", get(check_notifications))
        .route("/reset-timers", post(reset_timers))
}

pub async fn get_settings(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Envelope<SettingsData>>> {
    let settings = state.wellness.get_settings(&user_id).await?;
    Ok(success(SettingsData { settings }))
}

pub async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<WellnessSettingsUpdate>, JsonRejection>,
) -> AppResult<Json<Envelope<SettingsData>>> {
    let update = json_body(payload)?;
    let settings = state.wellness.update_settings(&user_id, update).await?;
    Ok(success(SettingsData { settings }))
}

/// The body is optional; an empty one pauses for the default hour.
pub async fn pause(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Bytes,
) -> AppResult<Json<Envelope<PauseStateData>>> {
    let request: PauseRequest = if body.iter().all(u8::is_ascii_whitespace) {
        PauseRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| AppError::BadRequest(format!("Invalid pause request: {err}")))?
    };
    let hours = request.duration.unwrap_or(DEFAULT_PAUSE_HOURS);
    let settings = state.wellness.pause(&user_id, Some(hours)).await?;
    Ok(success(PauseStateData {
        settings,
        message: format!("Wellness notifications paused for {hours} hour(s)"),
    }))
}

pub async fn resume(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Envelope<PauseStateData>>> {
    let settings = state.wellness.resume(&user_id).await?;
    Ok(success(PauseStateData {
        settings,
        message: "Wellness notifications resumed".into(),
    }))
}

pub async fn check_notifications(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Envelope<CheckOutcome>>> {
    let outcome = state.wellness.check(&user_id).await?;
    Ok(success(outcome))
}

pub async fn reset_timers(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Envelope<SettingsData>>> {
    let settings = state.wellness.reset_timers(&user_id).await?;
    Ok(success_with_message(
        "All notification timers have been reset",
        SettingsData { settings },
    ))
}
