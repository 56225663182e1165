//! Core crate for the Vigil wellness-check agent service.
//!
//! Owns the pieces every other crate builds on:
//!
//! - [`session`] — the single-session lifecycle manager and its driving task
//! - [`events`] — the event taxonomy and broadcast broker
//! - [`traits`] — contracts for the external call/conversation collaborator
//! - [`config`] — file + environment configuration
//!
//! The vendor-facing collaborator implementations live in `vigil-agent`;
//! the HTTP/WebSocket surface lives in `vigil-web`.

pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod test_support;
pub mod traits;

pub use config::{EdgeConfig, LlmConfig, ServerConfig, VigilConfig};
pub use error::{AgentError, AgentResult};
pub use events::{AgentEvent, AgentPhase, EventBroker};
pub use session::{
    SessionManager, SessionStatus, StartOutcome, StatusSnapshot,
};
pub use traits::{AgentFactory, AgentSession, CallHandle};
