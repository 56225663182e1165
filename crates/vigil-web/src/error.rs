//! Error surface of the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WebError>;

#[derive(Error, Debug)]
pub enum WebError {
    #[error("Invalid address: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// No report exists for the session (yet).
    #[error("No report available yet. The session may still be in progress.")]
    ReportNotReady,

    #[error("Timed out waiting for meeting URL")]
    JoinUrlTimeout,

    /// The agent session failed; carries the session's error text.
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Report rendering failed: {0}")]
    Render(String),
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Config(_) | Self::Io(_) | Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ReportNotReady => StatusCode::NOT_FOUND,
            Self::JoinUrlTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Agent(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_not_ready_maps_to_404() {
        let response = WebError::ReportNotReady.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn agent_errors_map_to_bad_gateway() {
        let response = WebError::Agent("edge refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
