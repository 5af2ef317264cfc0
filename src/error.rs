use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Persistence(String),

    #[error("Only admins can use this command.")]
    Unauthorized,

    #[error("Invalid signature - request must come from the bot gateway")]
    InvalidSignature,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Cannot give {amount} token(s). They already have {current} token(s) and the maximum allowed is {max}.")]
    LimitExceeded { current: u32, amount: u32, max: u32 },

    #[error("{user} doesn't have any tokens.")]
    NoBalance { user: String },

    #[error("{user} only has {current} token(s), but {requested} were requested.")]
    InsufficientBalance {
        user: String,
        current: u32,
        requested: u32,
    },

    #[error("No backups available.")]
    NoBackups,

    #[error("Invalid backup number. Please use a number between 1 and {available}.")]
    BackupNotFound { available: usize },

    #[error("No pending restore for backup {index}. Run /restore_backup {index} first.")]
    NoPendingRestore { index: i64 },

    #[error("The backup list changed since the restore was requested. Run /restore_backup again.")]
    RestoreChanged,
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Io(ref e) => {
                tracing::error!("I/O error: {:?}", e);
                return internal_error();
            }
            AppError::Persistence(ref msg) => {
                tracing::error!("Persistence failure: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::LimitExceeded { .. }
            | AppError::NoBalance { .. }
            | AppError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NoBackups | AppError::BackupNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::NoPendingRestore { .. } | AppError::RestoreChanged => StatusCode::CONFLICT,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

fn internal_error() -> Response {
    let body = Json(json!({
        "error": "Internal server error"
    }));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Unauthorized, StatusCode::FORBIDDEN),
            (AppError::InvalidSignature, StatusCode::UNAUTHORIZED),
            (AppError::InvalidInput("x".to_string()), StatusCode::BAD_REQUEST),
            (AppError::NoBackups, StatusCode::NOT_FOUND),
            (AppError::RestoreChanged, StatusCode::CONFLICT),
            (
                AppError::NoBalance {
                    user: "<@1>".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Persistence("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_io_error_is_generic_internal_error() {
        use http_body_util::BodyExt;

        let error: AppError = std::io::Error::new(std::io::ErrorKind::Other, "secret path").into();
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }
}
