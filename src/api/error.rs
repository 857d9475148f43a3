use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced to API clients as a structured
/// `{errors: [{message, code, status}]}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A single-entity lookup found no match.
    #[error("{0}")]
    NotFound(String),
    /// The backing query engine failed; the original error text is kept in
    /// the message.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// The server's own data files are missing or malformed.
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
    pub status: u16,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            _ => "http_error",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(message) => ApiError::ServiceUnavailable(message),
            StoreError::Config(message) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            errors: vec![ErrorDetail {
                message: self.to_string(),
                code: self.code().to_string(),
                status: status.as_u16(),
            }],
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_errors_map_to_status_codes() {
        let api: ApiError = StoreError::Unavailable("down".to_string()).into();
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);

        let api: ApiError = StoreError::Config("bad file".to_string()).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_body_shape() {
        let error = ApiError::NotFound("Subject not found".to_string());
        let body = ErrorBody {
            errors: vec![ErrorDetail {
                message: error.to_string(),
                code: "not_found".to_string(),
                status: 404,
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"errors": [{"message": "Subject not found", "code": "not_found", "status": 404}]})
        );
    }
}
