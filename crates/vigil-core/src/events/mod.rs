//! Event taxonomy and fan-out for the agent session.
//!
//! Every milestone of the driving task is published as an [`AgentEvent`]
//! through the [`EventBroker`]; the web layer forwards them verbatim to
//! connected dashboard clients. Delivery is broadcast-channel based: a
//! slow, lagged, or disconnected observer only ever loses its own copy and
//! never affects the emitter or other observers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Coarse phase of the driving task, published as `agent_status` events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    CreatingCall,
    JoiningCall,
    InCall,
    Analyzing,
    Finished,
}

impl std::fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatingCall => write!(f, "creating_call"),
            Self::JoiningCall => write!(f, "joining_call"),
            Self::InCall => write!(f, "in_call"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Events pushed to dashboard clients over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// The driving task reached a new phase.
    AgentStatus { status: AgentPhase },

    /// The join URL for the human participant is available.
    JoinUrl { url: String },

    /// The collaborator produced its wellness assessment.
    Assessment { data: Option<String> },

    /// A report document was rendered from the assessment.
    ReportReady,

    /// The session failed; `error` is the collaborator's message verbatim.
    AgentError { error: String },

    /// The session was stopped (normally or via `stop()`).
    AgentStopped,
}

impl AgentEvent {
    /// Stable event-type name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AgentStatus { .. } => "agent_status",
            Self::JoinUrl { .. } => "join_url",
            Self::Assessment { .. } => "assessment",
            Self::ReportReady => "report_ready",
            Self::AgentError { .. } => "agent_error",
            Self::AgentStopped => "agent_stopped",
        }
    }
}

/// Broadcast fan-out of [`AgentEvent`]s to currently connected observers.
///
/// Cloning shares the underlying channel; subscribers registered after an
/// event was emitted do not see it.
#[derive(Debug, Clone)]
pub struct EventBroker {
    tx: broadcast::Sender<AgentEvent>,
}

impl EventBroker {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Register an observer. Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.tx.subscribe()
    }

    /// Deliver an event to every observer. Never blocks, never fails the
    /// caller; with no observers the event is simply dropped.
    pub fn emit(&self, event: AgentEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("no observers registered, event dropped");
        }
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_matches_serialized_tag() {
        let events = vec![
            AgentEvent::AgentStatus {
                status: AgentPhase::CreatingCall,
            },
            AgentEvent::JoinUrl {
                url: "https://example.com/join/room1".into(),
            },
            AgentEvent::Assessment {
                data: Some("all clear".into()),
            },
            AgentEvent::ReportReady,
            AgentEvent::AgentError {
                error: "boom".into(),
            },
            AgentEvent::AgentStopped,
        ];

        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }

    #[test]
    fn events_round_trip() {
        let event = AgentEvent::AgentStatus {
            status: AgentPhase::Analyzing,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("analyzing"));
        let parsed: AgentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }

    #[tokio::test]
    async fn emit_reaches_every_subscriber() {
        let broker = EventBroker::new();
        let mut a = broker.subscribe();
        let mut b = broker.subscribe();

        broker.emit(AgentEvent::ReportReady);

        assert_eq!(a.recv().await.unwrap(), AgentEvent::ReportReady);
        assert_eq!(b.recv().await.unwrap(), AgentEvent::ReportReady);
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_fail_emit() {
        let broker = EventBroker::new();
        let rx = broker.subscribe();
        drop(rx);

        // Must not panic or error even though the only observer is gone.
        broker.emit(AgentEvent::AgentStopped);
        assert_eq!(broker.observer_count(), 0);
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let broker = EventBroker::new();
        broker.emit(AgentEvent::ReportReady);

        let mut late = broker.subscribe();
        broker.emit(AgentEvent::AgentStopped);
        assert_eq!(late.recv().await.unwrap(), AgentEvent::AgentStopped);
    }
}
