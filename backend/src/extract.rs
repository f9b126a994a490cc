//! Request extractors whose rejections use the crate's error body.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain-text bodies (and `422` for
//! JSON that does not match the payload type). These wrappers delegate to them and turn
//! every rejection into `ServiceError::Validation`, so a malformed request is answered
//! with `400` and `{"error": "..."}` like every other failure.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};

use crate::error::ServiceError;

/// ApiJson
///
/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// ApiPath
///
/// Typed path parameters, e.g. the `{id}` of `/posts/{id}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

/// ApiQuery
///
/// Typed query string, e.g. `?topic_id=3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

fn rejected(source: &'static str, message: String) -> ServiceError {
    tracing::debug!(source, reason = %message, "request input rejected");
    ServiceError::validation(message)
}

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected("body", rejection.body_text())),
        }
    }
}

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected("path", rejection.body_text())),
        }
    }
}

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected("query", rejection.body_text())),
        }
    }
}
