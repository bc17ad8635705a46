use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use super::routes::AppState;
use crate::models::ExerciseKind;

pub async fn home() -> Json<Value> {
    let exercises: Vec<String> = ExerciseKind::ALL
        .iter()
        .map(|kind| format!("/{}", kind.slug()))
        .collect();

    Json(json!({
        "message": "Welcome to the Exercise Detection API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "exercises": exercises,
            "control": ["/status", "/stop"],
            "health": ["/health"]
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let status = state.sessions.status();

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "active_exercise": status.active_exercise,
        "running": status.running
    })))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "message": "The requested endpoint does not exist"
        })),
    )
}
