use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// The model artifacts could not be fetched or turned into a usable model.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model artifact not found: {location}")]
    NotFound { location: String },

    #[error("failed to read model artifact {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch model artifact {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("model hub returned {status} for {location}")]
    HubStatus { location: String, status: u16 },

    #[error("model artifact {artifact} is corrupt: {reason}")]
    Corrupt { artifact: String, reason: String },

    #[error("model artifact {artifact} is incompatible with this server: {reason}")]
    Incompatible { artifact: String, reason: String },

    #[error("model loader panicked: {0}")]
    Panicked(String),
}

impl LoadError {
    pub(crate) fn corrupt(artifact: &str, reason: impl ToString) -> Self {
        LoadError::Corrupt {
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn incompatible(artifact: &str, reason: impl ToString) -> Self {
        LoadError::Incompatible {
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// The request body does not match the declared request schema.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("request body is not valid JSON: {0}")]
    Malformed(String),

    #[error("unsupported content type '{0}', expected application/json")]
    UnsupportedContentType(String),

    #[error("field '{field}' is required")]
    Missing { field: String },

    #[error("field '{field}' must be {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("field '{field}' is invalid: {message}")]
    Invalid { field: String, message: String },
}

impl ValidationError {
    /// Path of the offending field, when the failure is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::Missing { field }
            | ValidationError::WrongType { field, .. }
            | ValidationError::Invalid { field, .. } => Some(field),
            ValidationError::Malformed(_) | ValidationError::UnsupportedContentType(_) => None,
        }
    }
}

/// The model rejected or failed on a validated request.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("word '{0}' not present in vocabulary")]
    UnknownWord(String),

    #[error("input produced no tokens")]
    EmptyInput,

    #[error("token id {id} outside embedding table of {rows} rows")]
    TokenOutOfRange { id: u32, rows: usize },

    #[error("tokenization failed: {0}")]
    Tokenizer(String),

    #[error("model returned {actual} predictions for {expected} records")]
    Misaligned { expected: usize, actual: usize },

    #[error("scoring task panicked: {0}")]
    Panicked(String),
}

/// Every failure that can reach the HTTP boundary.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::Validation(ValidationError::UnsupportedContentType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServeError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServeError::Load(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServeError::Inference(_) | ServeError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServeError::Load(_) => "model_unavailable",
            ServeError::Validation(_) => "validation_error",
            ServeError::Inference(_) => "inference_error",
            ServeError::Serialization(_) => "serialization_error",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let field = match self {
            ServeError::Validation(e) => e.field().map(str::to_string),
            _ => None,
        };
        ErrorResponse {
            error: self.kind(),
            message: self.to_string(),
            field,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_response())).into_response()
    }
}
