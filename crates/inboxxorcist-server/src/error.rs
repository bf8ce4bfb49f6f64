//! Mapping of service errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inboxxorcist_core::{Error, ErrorKind};
use serde_json::json;
use tracing::{error, warn};

/// Message returned for every backend-unavailable response
pub const BACKEND_UNAVAILABLE_DETAIL: &str = "Model not loaded. Service temporarily unavailable.";

/// Which endpoint an error came from; picks the processing-error prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Email,
    Batch,
    Mailbox,
}

impl Operation {
    fn failure_prefix(self) -> &'static str {
        match self {
            Self::Email => "Error processing email",
            Self::Batch => "Error processing batch",
            Self::Mailbox => "Error processing MBOX file",
        }
    }
}

/// A service error on its way out of a handler
#[derive(Debug)]
pub struct AppError {
    operation: Operation,
    error: Error,
}

impl AppError {
    pub fn new(operation: Operation, error: impl Into<Error>) -> Self {
        Self {
            operation,
            error: error.into(),
        }
    }

    pub fn email(error: impl Into<Error>) -> Self {
        Self::new(Operation::Email, error)
    }

    pub fn batch(error: impl Into<Error>) -> Self {
        Self::new(Operation::Batch, error)
    }

    pub fn mailbox(error: impl Into<Error>) -> Self {
        Self::new(Operation::Mailbox, error)
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Processing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self.kind() {
            ErrorKind::BackendUnavailable => BACKEND_UNAVAILABLE_DETAIL.to_string(),
            ErrorKind::Validation => self.error.to_string(),
            ErrorKind::Processing => {
                format!("{}: {}", self.operation.failure_prefix(), self.error.message())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        match kind {
            ErrorKind::Processing => error!(operation = ?self.operation, "{}", self.error),
            ErrorKind::BackendUnavailable => {
                warn!(operation = ?self.operation, "Rejected request: {}", self.error)
            }
            ErrorKind::Validation => {}
        }
        metrics::counter!("inboxxorcist_errors_total", "kind" => kind.as_str()).increment(1);

        let body = json!({
            "detail": self.detail(),
            "error": kind.as_str(),
        });

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inboxxorcist_core::ValidationError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::email(Error::backend_unavailable("missing")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::batch(ValidationError::EmptyBatch).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::mailbox(Error::mailbox("truncated")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_detail_messages() {
        assert_eq!(
            AppError::email(Error::backend_unavailable("missing")).detail(),
            BACKEND_UNAVAILABLE_DETAIL
        );
        assert_eq!(
            AppError::email(ValidationError::EmptyInput).detail(),
            "Email text cannot be empty"
        );
        assert_eq!(
            AppError::batch(Error::classifier("boom")).detail(),
            "Error processing batch: boom"
        );
        assert_eq!(
            AppError::mailbox(Error::mailbox("bad archive")).detail(),
            "Error processing MBOX file: bad archive"
        );
    }
}
