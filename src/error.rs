//! HTTP-facing error type shared by every handler.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::directory::DirectoryError;
use crate::ledger::{LedgerError, StoreError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing/invalid field or unrecognised value.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate restricted punch. Reported as 400 to the client.
    #[error("{0}")]
    Conflict(String),

    /// Detail is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }

    /// Message placed in the `error` field of the response body.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Error en el servidor".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(detail) = self {
            error!(error = %detail, "Request failed");
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.public_message()
        }))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidPunchType(_) => {
                AppError::InvalidArgument("Tipo de ponche inválido".into())
            }
            LedgerError::EmployeeNotFound(_) => AppError::NotFound("Empleado no encontrado".into()),
            LedgerError::EmployeeInactive(_) => AppError::Forbidden("Empleado inactivo".into()),
            LedgerError::AlreadyPunched { kind, time } => AppError::Conflict(format!(
                "Ya registraste un ponche de {} hoy a las {}",
                kind.label(),
                time
            )),
            LedgerError::Storage(e) => AppError::internal(e),
            LedgerError::Directory(e) => AppError::internal(e),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        AppError::internal(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::punch::PunchType;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::InvalidArgument(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict(String::new()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Unauthorized(String::new()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden(String::new()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound(String::new()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_punch_message_names_previous_time() {
        let err: AppError = LedgerError::AlreadyPunched {
            kind: PunchType::In,
            time: "08:00".into(),
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(),
            "Ya registraste un ponche de entrada hoy a las 08:00"
        );
    }

    #[test]
    fn internal_detail_is_hidden() {
        let err = AppError::internal("connection reset");
        assert_eq!(err.public_message(), "Error en el servidor");
        assert!(err.to_string().contains("connection reset"));
    }
}
