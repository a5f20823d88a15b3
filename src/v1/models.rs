use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::super::{AppState, Model};

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub kind: &'static str,
    pub source: String,
    pub artifacts: &'static [&'static str],
    pub loaded: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    pub load_count: usize,
}

/// Describes the served model without loading it.
pub async fn describe_model<M: Model>(State(state): State<AppState<M>>) -> impl IntoResponse {
    let info = ModelInfo {
        kind: M::KIND,
        source: state.handle.source().to_string(),
        artifacts: M::ARTIFACTS,
        loaded: state.handle.is_loaded(),
        loaded_at: state.handle.loaded_at(),
        load_count: state.handle.load_count(),
    };

    (StatusCode::OK, Json(info))
}
