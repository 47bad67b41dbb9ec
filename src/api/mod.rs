//! HTTP API.
//!
//! JSON in and out, camelCase on the wire. Every route except registration,
//! login, health, and docs requires a bearer token.

mod comments;
mod projects;
mod server;
mod states;
mod task_states;
mod tasks;
mod users;

pub use server::{AppState, build_router, start_server};

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

/// Header carrying the generation provider hint.
pub const MODEL_TYPE_HEADER: &str = "modeltype";

/// The `modeltype` header, if present and non-empty.
pub fn provider_hint(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(MODEL_TYPE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// `Json` with rejections rendered as [`ApiError`].
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::invalid_body(rejection.body_text())),
        }
    }
}

/// `Path` with rejections rendered as [`ApiError`].
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(ApiError::invalid_value("id", &rejection.body_text())),
        }
    }
}

/// `Query` with rejections rendered as [`ApiError`].
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(ApiError::invalid_body(rejection.body_text())),
        }
    }
}

/// A JSON body that may be absent. An empty or whitespace-only body yields
/// `T::default()`.
pub struct OptionalJson<T>(pub T);

impl<S, T> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_body(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(OptionalJson)
            .map_err(|err| ApiError::invalid_body(err.to_string()))
    }
}

/// A non-blank string field.
pub(crate) fn required_text(value: Option<String>, field: &str) -> ApiResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::missing_field(field)),
    }
}

/// A present id field.
pub(crate) fn required_id(value: Option<i64>, field: &str) -> ApiResult<i64> {
    value.ok_or_else(|| ApiError::missing_field(field))
}

/// A blank optional string counts as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn hint_reads_modeltype_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(provider_hint(&headers), None);
        headers.insert("ModelType", HeaderValue::from_static(" ibm-watson "));
        assert_eq!(provider_hint(&headers), Some("ibm-watson"));
        headers.insert("modeltype", HeaderValue::from_static(""));
        assert_eq!(provider_hint(&headers), None);
    }

    #[test]
    fn required_fields_reject_blank() {
        assert!(required_text(Some("x".to_string()), "name").is_ok());
        let err = required_text(Some("  ".to_string()), "name").unwrap_err();
        assert_eq!(err.field.as_deref(), Some("name"));
        assert!(required_text(None, "name").is_err());
        assert!(required_id(None, "taskId").is_err());
        assert_eq!(optional_text(Some(" ".to_string())), None);
    }
}
