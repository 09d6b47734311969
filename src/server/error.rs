//! Error types for the REST API server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Invalid parameter in request
    InvalidParameter(String),
    /// Invalid date range
    InvalidDateRange(String),
    /// The transaction source could not be read
    SourceUnavailable(String),
    /// Internal server error
    InternalError(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ApiError::InvalidDateRange(msg) => write!(f, "Invalid date range: {}", msg),
            ApiError::SourceUnavailable(msg) => write!(f, "Source unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameter(_) | ApiError::InvalidDateRange(_) => StatusCode::BAD_REQUEST,
            ApiError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message) = match self {
            ApiError::InvalidParameter(msg) => ("InvalidParameter", msg),
            ApiError::InvalidDateRange(msg) => ("InvalidDateRange", msg),
            ApiError::SourceUnavailable(msg) => ("SourceUnavailable", msg),
            ApiError::InternalError(msg) => ("InternalError", msg),
        };

        if status.is_server_error() {
            tracing::error!(error = error_type, %message, "request failed");
        }

        let body = Json(json!({
            "error": error_type,
            "message": message,
        }));

        (status, body).into_response()
    }
}

// Conversions from other error types

impl From<crate::transaction::SourceError> for ApiError {
    fn from(err: crate::transaction::SourceError) -> Self {
        ApiError::SourceUnavailable(err.to_string())
    }
}

impl From<crate::export::ExportError> for ApiError {
    fn from(err: crate::export::ExportError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<crate::meal::ParseMealError> for ApiError {
    fn from(err: crate::meal::ParseMealError) -> Self {
        ApiError::InvalidParameter(err.to_string())
    }
}

impl From<crate::student_id::StudentIdError> for ApiError {
    fn from(err: crate::student_id::StudentIdError) -> Self {
        ApiError::InvalidParameter(err.to_string())
    }
}

impl From<chrono::ParseError> for ApiError {
    fn from(err: chrono::ParseError) -> Self {
        ApiError::InvalidDateRange(format!("Date parse error: {}", err))
    }
}
