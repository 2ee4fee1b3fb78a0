use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use tracing::info;

use orderbell_scheduler::Scheduler;
use orderbell_types::api::{
    HealthResponse, RegisterRequest, RegisterResponse, UnregisterRequest, UnregisterResponse,
};
use orderbell_types::models::Credentials;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Scheduler,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/unregister", post(unregister))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(req) = body?;
    info!(username = %req.username, "registration request");

    state
        .scheduler
        .register(Credentials::new(req.username, req.password), req.fcm_token)
        .await?;

    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful".into(),
    }))
}

/// Always succeeds; unknown tokens are ignored.
pub async fn unregister(
    State(state): State<AppState>,
    body: Result<Json<UnregisterRequest>, JsonRejection>,
) -> Result<Json<UnregisterResponse>, ApiError> {
    let Json(req) = body?;
    state.scheduler.unregister(&req.fcm_token).await;
    Ok(Json(UnregisterResponse { success: true }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        registrations: state.scheduler.len().await,
    })
}
