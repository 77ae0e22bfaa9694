use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::model::{ChatResponse, ErrorBody};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing, malformed or empty conversation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The completion service was unreachable, failed, or returned nothing usable.
    #[error("generation failed: {0:#}")]
    GenerationFailed(#[source] anyhow::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GatewayError::GenerationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            GatewayError::InvalidInput(message) => {
                warn!(%message, "Rejecting chat request");
                (status, Json(ErrorBody { error: message })).into_response()
            }
            // Renderers always get an idea-shaped body, even on failure.
            GatewayError::GenerationFailed(e) => {
                error!("Completion failed: {:#}", e);
                (status, Json(ChatResponse::apology())).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::InvalidInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::GenerationFailed(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_generation_failed_keeps_cause_in_message() {
        let err = GatewayError::GenerationFailed(
            anyhow::anyhow!("connection refused").context("Failed to reach completion API"),
        );
        let message = err.to_string();
        assert!(message.contains("Failed to reach completion API"));
        assert!(message.contains("connection refused"));
    }
}
