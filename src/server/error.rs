//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::repository::DbError;
use crate::service::ServiceError;

/// An error ready to be rendered as an HTTP response.
///
/// Every error body is `{"error": "..."}`. Internal errors keep their detail
/// in the logs and send a generic message to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => Self::bad_request(msg),
            ServiceError::JobNotFound => Self::not_found("ingestion job not found"),
            ServiceError::RecipeNotFound => Self::not_found("recipe not found"),
            ServiceError::Conflict(msg) => Self::conflict(msg),
            ServiceError::UnsupportedStatus(_) => {
                error!(error = %e, "unsupported import status");
                Self::internal()
            }
            other => {
                error!(error = %other, "ingestion operation failed");
                Self::internal()
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        error!(error = %e, "database operation failed");
        Self::internal()
    }
}
