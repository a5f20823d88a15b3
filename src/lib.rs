use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handle;
pub mod models;
pub mod schema;
pub mod server;
pub mod v1;

pub use error::{InferenceError, LoadError, ServeError, ValidationError};
pub use handle::{ArtifactFetcher, Artifacts, LoadedModel, ModelHandle, ModelSource};
pub use models::Model;

pub struct AppState<M> {
    pub handle: Arc<ModelHandle<M>>,
}

impl<M> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<M: Model> AppState<M> {
    pub fn new(handle: ModelHandle<M>) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }
}

pub fn create_app<M: Model>(state: AppState<M>) -> Router {
    Router::new()
        .route("/ping", get(v1::ping::<M>))
        .route("/health", get(v1::health_check::<M>))
        .route("/invocations", post(v1::invocations::<M>))
        .route("/v1/model", get(v1::describe_model::<M>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
