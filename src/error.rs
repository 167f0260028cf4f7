use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

use crate::{reconcile::ReconcileError, store::StoreError};

/// Errors surfaced by HTTP handlers. Bodies are `{"message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Reconcile(ReconcileError::LeaveNotApproved(_))
            | AppError::Reconcile(ReconcileError::InvertedRange(_)) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Reconcile(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            // Store details stay in the logs
            AppError::Store(e) | AppError::Reconcile(ReconcileError::Store(e)) => {
                error!(error = %e, "Store error");
                "Internal Server Error".to_string()
            }
            other => {
                if status.is_server_error() {
                    error!(error = %other, "Request failed");
                }
                other.to_string()
            }
        };
        HttpResponse::build(status).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_is_a_server_error() {
        let err = AppError::from(ReconcileError::MissingPushCredentials);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unapproved_leave_is_a_client_error() {
        let err = AppError::from(ReconcileError::LeaveNotApproved(3));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    }
}
