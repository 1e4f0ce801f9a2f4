use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures of the todo service.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("todo {0} not found")]
    NotFound(u32),

    #[error("todo rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Interception(#[from] clockwork::Error),
}

/// Failures surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Todo(#[from] TodoError),

    #[error(transparent)]
    Interception(#[from] clockwork::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Todo(TodoError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Todo(TodoError::Rejected(_)) => StatusCode::NOT_ACCEPTABLE,
            ApiError::Todo(TodoError::Interception(_)) | ApiError::Interception(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request refused");
        }
        status.into_response()
    }
}

/// Invalid values in the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {source}")]
    InvalidPort {
        key: &'static str,
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid TODO_HOST value {value:?}: {source}")]
    InvalidHost {
        value: String,
        source: std::net::AddrParseError,
    },
}
