//! HTTP surface: router assembly, the response envelope and the
//! authenticated-user extractor.

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts},
    http::{request::Parts, Uri},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{error::AppError, notifications, reminders, tasks, todos, wellness, AppState};

/// Header carrying the authenticated user id, set by the auth gateway in
/// front of this service after it has verified the session token.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        status: "success",
        message: None,
        data,
    })
}

pub fn success_with_message<T: Serialize>(message: impl Into<String>, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        status: "success",
        message: Some(message.into()),
        data,
    })
}

/// Unwraps a JSON body, turning axum's rejection into a client error.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Id of the user the request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| CurrentUser(value.to_string()))
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "You are not logged in. Please log in to access this resource".into(),
                )
            })
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Can't find {uri} on this server!"))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/wellness", wellness::commands::routes())
        .nest("/api/notifications", notifications::commands::routes())
        .nest("/api/tasks", tasks::commands::routes())
        .nest("/api/todos", todos::commands::routes())
        .nest("/api/reminders", reminders::commands::routes())
        .fallback(not_found)
        .with_state(state)
}
