#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use inference_shim::{create_app, AppState, ArtifactFetcher, Model, ModelHandle, ModelSource};

pub const IRIS_TREE: &str = r#"{
    "feature_names": ["sepal_length", "sepal_width", "petal_length", "petal_width"],
    "classes": ["setosa", "versicolor", "virginica"],
    "nodes": [
        {"feature": 2, "threshold": 2.45, "left": 1, "right": 2},
        {"class": 0},
        {"feature": 3, "threshold": 1.75, "left": 3, "right": 4},
        {"feature": 2, "threshold": 4.95, "left": 5, "right": 6},
        {"class": 2},
        {"class": 1},
        {"class": 2}
    ]
}"#;

pub const WORD_VECTORS: &str = "3 2\ncasa 1.0 0.0\nlar 0.9 0.1\ncarro 0.0 1.0\n";

pub fn write_artifact(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("Failed to write test artifact");
}

pub fn model_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for (name, contents) in files {
        write_artifact(dir.path(), name, contents);
    }
    dir
}

pub fn handle_for<M: Model>(dir: &Path) -> ModelHandle<M> {
    ModelHandle::new(
        ModelSource::Directory(dir.to_path_buf()),
        ArtifactFetcher::default(),
    )
}

pub fn app_for<M: Model>(dir: &Path) -> (Router, AppState<M>) {
    let state = AppState::new(handle_for::<M>(dir));
    (create_app(state.clone()), state)
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
