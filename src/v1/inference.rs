use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

use super::super::{schema, AppState, InferenceError, Model, ModelHandle, ServeError, ValidationError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const JSON: &str = "application/json";

/// POST /invocations
///
/// Parses the body into the model's request envelope, scores it in one call
/// on the blocking pool and returns the serialized response. Every response
/// carries the invocation's request id in `x-request-id`.
pub async fn invocations<M: Model>(
    State(state): State<AppState<M>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("invocation", model = M::KIND, request_id = %request_id);

    let mut response = match run_invocation(&state.handle, &headers, &body).instrument(span).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, JSON)], bytes).into_response(),
        Err(e) => e.into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Runs one request through `Received -> Validated -> Scored -> Serialized`.
pub async fn run_invocation<M: Model>(
    handle: &ModelHandle<M>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Vec<u8>, ServeError> {
    debug!(stage = "received", bytes = body.len());

    let request = match check_content_type(headers).and_then(|_| schema::parse::<M::Request>(body)) {
        Ok(request) => request,
        Err(e) => {
            warn!(stage = "rejected", error = %e, "Invalid invocation request");
            return Err(e.into());
        }
    };
    debug!(stage = "validated");

    let scored = async {
        let loaded = handle.acquire().await?;
        let response = tokio::task::spawn_blocking(move || loaded.model.invoke(request))
            .await
            .map_err(|e| InferenceError::Panicked(e.to_string()))??;
        Ok::<_, ServeError>(response)
    }
    .await;

    let response = match scored {
        Ok(response) => response,
        Err(e) => {
            error!(stage = "failed", error = %e, "Invocation failed");
            return Err(e);
        }
    };
    debug!(stage = "scored");

    let bytes = schema::serialize(&response).map_err(|e| {
        error!(stage = "failed", error = %e, "Response serialization failed");
        ServeError::Serialization(e)
    })?;
    debug!(stage = "serialized", bytes = bytes.len());

    Ok(bytes)
}

fn check_content_type(headers: &HeaderMap) -> Result<(), ValidationError> {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return Ok(());
    };
    let raw = String::from_utf8_lossy(value.as_bytes());
    let mime = raw.split(';').next().unwrap_or_default().trim();
    if mime.eq_ignore_ascii_case(JSON) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedContentType(raw.into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_content_type(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_json_and_missing_content_type() {
        assert!(check_content_type(&HeaderMap::new()).is_ok());
        assert!(check_content_type(&with_content_type("application/json")).is_ok());
        assert!(check_content_type(&with_content_type("Application/JSON; charset=utf-8")).is_ok());
    }

    #[test]
    fn rejects_other_content_types() {
        let err = check_content_type(&with_content_type("text/csv")).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedContentType("text/csv".to_string()));
    }
}
