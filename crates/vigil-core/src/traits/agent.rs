//! Collaborator traits for the video-call edge and the conversational agent.
//!
//! The session driving task only ever talks to these traits; the vendor
//! glue in `vigil-agent` implements them over REST, and
//! [`crate::test_support::ScriptedAgent`] implements them in-process for
//! tests.

use async_trait::async_trait;

use crate::error::AgentResult;

/// Handle to a call created on the video edge.
///
/// Opaque to the lifecycle: the identifiers are echoed back to the
/// collaborator for join/teardown and otherwise only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHandle {
    pub call_type: String,
    pub call_id: String,
}

impl CallHandle {
    pub fn new(call_type: impl Into<String>, call_id: impl Into<String>) -> Self {
        Self {
            call_type: call_type.into(),
            call_id: call_id.into(),
        }
    }

    /// Composite id in the edge's `type:id` form, used for logging.
    pub fn cid(&self) -> String {
        format!("{}:{}", self.call_type, self.call_id)
    }
}

/// One agent session against the external collaborator.
///
/// Methods are invoked in a fixed order by the driving task:
/// `create_user` → `demo_join_url` → `create_call` → `join` → one or more
/// `simple_response` turns → `finish`. Implementations may hold connection
/// state between calls; they are never used concurrently.
#[async_trait]
pub trait AgentSession: Send {
    /// Ensure the agent's user identity exists on the edge.
    async fn create_user(&mut self) -> AgentResult<()>;

    /// Produce the externally reachable join URL a human uses to enter the
    /// same call the agent is about to join.
    async fn demo_join_url(&mut self, call_type: &str, call_id: &str) -> AgentResult<String>;

    /// Create (or fetch) the call on the edge.
    async fn create_call(&mut self, call_type: &str, call_id: &str) -> AgentResult<CallHandle>;

    /// Join the call as the agent participant.
    async fn join(&mut self, call: &CallHandle) -> AgentResult<()>;

    /// Send one utterance and return the collaborator's reply, if any.
    async fn simple_response(&mut self, prompt: &str) -> AgentResult<Option<String>>;

    /// Wrap up the conversation and tear the call down.
    ///
    /// Must be safe to call more than once; the driving task also invokes
    /// it best-effort when unwinding from a failure or cancellation.
    async fn finish(&mut self) -> AgentResult<()>;
}

/// Constructs a fresh [`AgentSession`] for each `start()`.
pub trait AgentFactory: Send + Sync {
    fn create(&self) -> AgentResult<Box<dyn AgentSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_handle_cid() {
        let call = CallHandle::new("default", "room1");
        assert_eq!(call.cid(), "default:room1");
    }
}
