use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use super::exercises::{get_status, start_exercise, stop_exercise};
use super::health::{health_check, home, not_found};
use crate::models::ExerciseKind;
use crate::services::SessionManager;

/// Shared state for control API handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
}

fn start_route(kind: ExerciseKind) -> MethodRouter<AppState> {
    post(move |state: State<AppState>| start_exercise(state, kind))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Internal server error: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal server error",
            "message": "An unexpected error occurred"
        })),
    )
        .into_response()
}

pub fn create_routes(sessions: Arc<SessionManager>) -> Router {
    let state = AppState { sessions };

    let mut router = Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/stop", post(stop_exercise));

    for kind in ExerciseKind::ALL {
        router = router.route(&format!("/{}", kind.slug()), start_route(kind));
    }

    router
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        // Mobile client calls from another origin
        .layer(CorsLayer::permissive())
}
