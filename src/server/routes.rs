use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::services::ServeDir;
use tracing::{debug, error};

use crate::combat::{calculate, CalculateError, CalculateRequest};
use crate::data::CharacterRepository;
use crate::parallel::WorkerPool;
use crate::server::api::{self, ErrorResponse, LeaderboardRequest};

/// Built frontend, served for every non-API path.
pub const STATIC_DIR: &str = "frontend/dist";

#[derive(Debug)]
pub struct AppState {
    pub repository: Arc<CharacterRepository>,
    pub pool: WorkerPool,
}

impl AppState {
    pub fn new(repository: Arc<CharacterRepository>, pool: WorkerPool) -> Self {
        Self { repository, pool }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/characters", get(characters))
        .route("/api/calculate", post(calculate_damage))
        .route("/api/leaderboard", post(leaderboard))
        .fallback_service(ServeDir::new(STATIC_DIR))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

fn bad_request(rejection: JsonRejection) -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        format!("Invalid request body: {}", rejection.body_text()),
    )
}

async fn health(State(state): State<Arc<AppState>>) -> Json<api::HealthResponse> {
    Json(api::health(&state.repository))
}

async fn characters(State(state): State<Arc<AppState>>) -> Json<api::CharacterListResponse> {
    Json(api::character_list(&state.repository))
}

async fn calculate_damage(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection),
    };
    let worker_state = Arc::clone(&state);
    let outcome =
        tokio::task::spawn_blocking(move || calculate(&worker_state.repository, &request)).await;
    match outcome {
        Ok(Ok(report)) => Json(report).into_response(),
        Ok(Err(err @ CalculateError::NotFound(_))) => {
            debug!(%err, "calculate request for unknown character");
            error_response(StatusCode::NOT_FOUND, err.to_string())
        }
        Err(err) => {
            error!(%err, "calculate task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

async fn leaderboard(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LeaderboardRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection),
    };
    let worker_state = Arc::clone(&state);
    let ranked = tokio::task::spawn_blocking(move || {
        api::leaderboard(&worker_state.repository, request, &worker_state.pool)
    })
    .await;
    match ranked {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            error!(%err, "leaderboard task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
