use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::super::{AppState, Model, ModelHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub model: &'static str,
    pub loaded: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    pub load_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Healthy iff the model can be acquired. May trigger the first load.
pub async fn check<M: Model>(handle: &ModelHandle<M>) -> (HealthStatus, Option<String>) {
    match handle.acquire().await {
        Ok(_) => (HealthStatus::Healthy, None),
        Err(e) => {
            warn!(model = M::KIND, error = %e, "Health check failed");
            (HealthStatus::Unhealthy, Some(e.to_string()))
        }
    }
}

pub async fn ping<M: Model>(State(state): State<AppState<M>>) -> StatusCode {
    match check(&state.handle).await {
        (HealthStatus::Healthy, _) => StatusCode::OK,
        (HealthStatus::Unhealthy, _) => StatusCode::NOT_FOUND,
    }
}

pub async fn health_check<M: Model>(State(state): State<AppState<M>>) -> impl IntoResponse {
    let (status, error) = check(&state.handle).await;
    let response = HealthResponse {
        status,
        timestamp: Utc::now(),
        model: M::KIND,
        loaded: state.handle.is_loaded(),
        loaded_at: state.handle.loaded_at(),
        load_count: state.handle.load_count(),
        error,
    };

    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(response))
}
