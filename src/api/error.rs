use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::ExerciseKind;
use crate::services::SessionError;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Another exercise is already running")]
    AlreadyRunning { active: ExerciseKind },
    #[error("No exercise is currently running")]
    NotRunning,
    #[error("Failed to start {} detection: {message}", .exercise.display_name().to_lowercase())]
    StartFailed {
        exercise: ExerciseKind,
        message: String,
    },
}

impl ControlError {
    /// Map a session error raised while starting `exercise`
    pub fn from_start(exercise: ExerciseKind, err: SessionError) -> Self {
        match err {
            SessionError::AlreadyRunning { active } => ControlError::AlreadyRunning { active },
            SessionError::NotRunning => ControlError::NotRunning,
            SessionError::Capture(e) => {
                error!("Error starting {}: {}", exercise, e);
                ControlError::StartFailed {
                    exercise,
                    message: e.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ControlError::AlreadyRunning { active } => (
                StatusCode::CONFLICT,
                json!({
                    "error": self.to_string(),
                    "active_exercise": active,
                }),
            ),
            ControlError::NotRunning => (
                StatusCode::BAD_REQUEST,
                json!({ "status": self.to_string() }),
            ),
            ControlError::StartFailed { exercise, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": format!(
                        "Failed to start {} detection",
                        exercise.display_name().to_lowercase()
                    ),
                    "message": message,
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
