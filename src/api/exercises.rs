use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tracing::info;

use super::error::ControlError;
use super::routes::AppState;
use crate::models::{ExerciseKind, SessionStatus};

/// Start detection for `kind`
pub async fn start_exercise(
    State(state): State<AppState>,
    kind: ExerciseKind,
) -> Result<Json<Value>, ControlError> {
    // Opening the camera blocks
    let sessions = state.sessions.clone();
    let handle = tokio::task::spawn_blocking(move || sessions.try_start(kind))
        .await
        .map_err(|e| ControlError::StartFailed {
            exercise: kind,
            message: e.to_string(),
        })?
        .map_err(|e| ControlError::from_start(kind, e))?;

    Ok(Json(json!({
        "status": format!("{} Detection started", kind.display_name()),
        "message": "Position yourself in front of the camera",
        "session_id": handle.id,
    })))
}

/// Stop the currently running exercise
pub async fn stop_exercise(State(state): State<AppState>) -> Result<Json<Value>, ControlError> {
    let summary = state
        .sessions
        .stop_active()
        .await
        .map_err(|_| ControlError::NotRunning)?;

    info!(
        "Exercise {} stopped with {} reps",
        summary.exercise, summary.final_rep_count
    );

    Ok(Json(json!({
        "status": "Exercise stopped",
        "exercise": summary.exercise,
        "final_rep_count": summary.final_rep_count,
    })))
}

/// Get current exercise status
pub async fn get_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.sessions.status())
}
