//! HTTP error mapping.
//!
//! Client mistakes (validation, missing files, name conflicts) are answered
//! with their own message. Everything else is logged here and answered with a
//! fixed, endpoint-specific message so internals never leak.

use crate::service::ServiceError;
use crate::types::ErrorBody;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// `public` goes to the client, `detail` only to the log.
    #[error("{public}: {detail}")]
    Internal { public: &'static str, detail: String },
}

const GENERIC_FAILURE: &str = "Internal server error";

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Map a service error, using `public` as the message for server faults.
    pub fn from_service(err: ServiceError, public: &'static str) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::BadRequest(msg),
            ServiceError::NotFound(msg) => Self::NotFound(msg),
            ServiceError::Conflict(msg) => Self::Conflict(msg),
            ServiceError::Processing(detail) => Self::Internal { public, detail },
            ServiceError::Io(e) => Self::Internal {
                public,
                detail: e.to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::from_service(err, GENERIC_FAILURE)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        // Oversized bodies surface here as well; they are the client's fault.
        Self::BadRequest(format!("Invalid upload: {}", e.body_text()))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal {
            public: GENERIC_FAILURE,
            detail: format!("worker task failed: {e}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Conflict(msg) => {
                tracing::debug!(status = status.as_u16(), error = %msg, "request rejected");
                msg
            }
            Self::Internal { public, detail } => {
                tracing::error!(error = %detail, "{public}");
                public.to_string()
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Failure to start or run the listener.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Startup failed: {0}")]
    Service(#[from] ServiceError),
}
