use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use firmware_store::ServiceError;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `FILE_TOO_LARGE`,
    /// `LATEST_PROTECTED`, `NOT_FOUND`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid firmware filename: only .bin files are allowed")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TooLarge(String),
    LatestProtected,
    NotFound(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TooLarge(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "FILE_TOO_LARGE",
                    message: msg,
                },
            ),
            AppError::LatestProtected => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "LATEST_PROTECTED",
                    message: "Cannot delete latest.bin file".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidName(e) => AppError::Validation(e.to_string()),
            ServiceError::TooLarge { .. } => AppError::TooLarge(err.to_string()),
            ServiceError::NotFound(_) => AppError::NotFound("Firmware file not found".into()),
            ServiceError::LatestProtected => AppError::LatestProtected,
            ServiceError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}
