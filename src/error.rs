use axum::{http::StatusCode, response::IntoResponse, Json};

/// Failures talking to the backend security API. The backend does not expose
/// a structured error taxonomy; everything is "fetch failed", split only into
/// transport errors and non-2xx statuses for logging.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}")]
    Status { status: u16 },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session has been revoked")]
    Revoked,

    #[error("access denied: requires {required}")]
    Forbidden { required: String },

    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Console-surface error type. Every page-level failure is contained to its
/// endpoint; nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] ApiError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Session(SessionError::Revoked) => {
                (StatusCode::UNAUTHORIZED, "session has been revoked".to_string())
            }
            AppError::Session(err @ SessionError::Forbidden { .. }) => {
                (StatusCode::FORBIDDEN, err.to_string())
            }
            AppError::Session(err @ SessionError::UnknownRole(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::Upstream(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            AppError::Internal(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("internal error: {}", err))
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
