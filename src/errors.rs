use crate::services::session_service::SessionError;
use crate::services::signaling_service::SignalingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let status = match &err {
            SessionError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SessionError::SessionEnded(_) => StatusCode::CONFLICT,
            SessionError::InvalidUserId { .. } | SessionError::InvalidTranscript(_) => {
                StatusCode::BAD_REQUEST
            }
            SessionError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::new(status, err.to_string())
    }
}

impl From<SignalingError> for AppError {
    fn from(err: SignalingError) -> Self {
        let status = match &err {
            SignalingError::ChannelNotFound(_) => StatusCode::NOT_FOUND,
            SignalingError::NoPendingOffer(_) => StatusCode::CONFLICT,
            SignalingError::InvalidRole(_) => StatusCode::BAD_REQUEST,
        };
        AppError::new(status, err.to_string())
    }
}
