//! HTTP error mapping
//!
//! Expected outcomes keep their message. Failures are already logged with
//! context by the layer that hit them and reach the client as a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::errors::PlanError;
use crate::search::SearchError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Search(#[from] SearchError),

    /// Request body or query string could not be parsed
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Plan(PlanError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Plan(PlanError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Plan(PlanError::Invalid(_)) => StatusCode::BAD_REQUEST,
            ApiError::Plan(PlanError::Corrupt { .. } | PlanError::Dependency(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Search(SearchError::IndexNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Search(SearchError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn client_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.client_message(),
            code: err.status_code().as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::from(PlanError::NotFound("p1".into())), StatusCode::NOT_FOUND),
            (ApiError::from(PlanError::Conflict("p1".into())), StatusCode::CONFLICT),
            (ApiError::from(PlanError::Invalid("x".into())), StatusCode::BAD_REQUEST),
            (
                ApiError::from(PlanError::corrupt("p1", "eof")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(PlanError::Dependency("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{}", err);
        }
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = ApiError::from(PlanError::Dependency("redis at 10.0.0.1 refused".into()));
        let body = ErrorResponse::from(&err);
        assert_eq!(body.error, "Internal server error");
        assert_eq!(body.code, 500);

        let err = ApiError::from(PlanError::NotFound("p1".into()));
        assert_eq!(ErrorResponse::from(&err).error, "Record not found: p1");
    }
}
