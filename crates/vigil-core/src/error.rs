//! Error types shared across the collaborator boundary.

use thiserror::Error;

/// Errors surfaced by the external call/conversation collaborator.
///
/// The driving task does not retry: any of these ends the session in the
/// `error` state with the message captured verbatim.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Building the collaborator failed before any call work started.
    #[error("Agent setup failed: {0}")]
    Setup(String),

    /// The request never reached the remote service (DNS, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The remote service answered, but the payload was not usable.
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_and_message() {
        let err = AgentError::Api {
            status: 429,
            message: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "API error (429): rate limited");
    }
}
