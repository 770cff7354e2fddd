//! Error responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use walletkit_core::ServiceError;

/// JSON error body: `{error, details?}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
            details: None,
        }
    }

    pub fn invalid_action() -> Self {
        Self::bad_request("Invalid action")
    }

    /// Validation errors keep their own message; anything else becomes
    /// `{error: context, details}`.
    pub fn with_context(err: ServiceError, context: &str) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::bad_request(msg),
            other => Self {
                status: status_of(&other),
                error: context.to_string(),
                details: Some(other.details()),
            },
        }
    }
}

fn status_of(err: &ServiceError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// `{error: <message>}` with the error's own status.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self {
            status: status_of(&err),
            error: err.to_string(),
            details: None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid request body".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid query".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
