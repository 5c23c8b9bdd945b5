//! HTTP mapping of domain failures
//!
//! Every handler returns `Result<_, ApiError>`; the status code and JSON
//! body are decided here and nowhere else.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::DomainError;

#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    RateLimited { retry_after: u64 },
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::Domain(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::RateLimited { retry_after } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": "Too many requests" })),
                )
                    .into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            ApiError::Domain(DomainError::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Contact not found" })),
            )
                .into_response(),
            ApiError::Domain(DomainError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "Validation error", "detail": errors })),
            )
                .into_response(),
            ApiError::Domain(DomainError::Conflict(msg)) => {
                (StatusCode::CONFLICT, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Domain(DomainError::Unauthorized(msg)) => {
                let mut response =
                    (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Domain(e @ (DomainError::Database(_) | DomainError::Internal(_))) => {
                tracing::error!("{}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// `Json` whose rejections (bad syntax, missing fields, wrong content type)
/// surface as 422 validation errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(DomainError::invalid("body", &rejection.body_text()).into()),
        }
    }
}

/// `Query` whose rejections surface as 422 validation errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ValidQuery(value)),
            Err(rejection) => Err(DomainError::invalid("query", &rejection.body_text()).into()),
        }
    }
}

/// `Path` whose rejections surface as 404: an id that does not parse names
/// no stored record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ValidPath(value)),
            Err(rejection) => {
                tracing::debug!("Unparseable path: {}", rejection.body_text());
                Err(DomainError::NotFound.into())
            }
        }
    }
}
