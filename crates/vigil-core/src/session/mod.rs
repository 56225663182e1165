//! Session state for the wellness-check agent.
//!
//! At most one agent session exists per process. [`SessionManager`] owns
//! the single mutable [`SessionState`] instance plus the background task
//! driving the external collaborator; everything else reads the state
//! through [`StatusSnapshot`] projections.

mod manager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub use manager::{SessionManager, StartOutcome};

/// Lifecycle phase of the (single) agent session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
    Error,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Join-URL gate value. Re-armed to `Pending` by every `start()`; waiters
/// block until the driving task publishes `Ready` or the session fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JoinUrlState {
    Pending,
    Ready(String),
    Failed,
}

/// The single mutable session record.
///
/// While a session is running, the driving task has exclusive write access;
/// all other parties only take snapshots.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub status: SessionStatus,
    pub call_type: Option<String>,
    pub call_id: Option<String>,
    pub join_url: Option<String>,
    pub last_assessment: Option<String>,
    pub error_message: Option<String>,
    pub report: Option<Vec<u8>>,
    pub started_at: Option<DateTime<Utc>>,
    join_gate: watch::Sender<JoinUrlState>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            call_type: None,
            call_id: None,
            join_url: None,
            last_assessment: None,
            error_message: None,
            report: None,
            started_at: None,
            join_gate: watch::channel(JoinUrlState::Pending).0,
        }
    }

    /// Clear every per-session field and re-arm the join-URL gate.
    pub fn reset_for(&mut self, call_type: String, call_id: String) {
        self.status = SessionStatus::Starting;
        self.call_type = Some(call_type);
        self.call_id = Some(call_id);
        self.join_url = None;
        self.last_assessment = None;
        self.error_message = None;
        self.report = None;
        self.started_at = Some(Utc::now());
        self.join_gate = watch::channel(JoinUrlState::Pending).0;
    }

    pub fn publish_join_url(&mut self, url: &str) {
        self.join_url = Some(url.to_string());
        let _ = self.join_gate.send(JoinUrlState::Ready(url.to_string()));
    }

    /// Wake any join-URL waiters on a session that will never produce one.
    pub fn unblock_join_waiters(&self) {
        self.join_gate.send_if_modified(|gate| {
            if matches!(gate, JoinUrlState::Pending) {
                *gate = JoinUrlState::Failed;
                true
            } else {
                false
            }
        });
    }

    pub fn subscribe_join_gate(&self) -> watch::Receiver<JoinUrlState> {
        self.join_gate.subscribe()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            call_type: self.call_type.clone(),
            call_id: self.call_id.clone(),
            has_assessment: self.last_assessment.is_some(),
            has_report: self.report.is_some(),
            error: self.error_message.clone(),
            join_url: self.join_url.clone(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only projection of the session state, served to API clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSnapshot {
    pub status: SessionStatus,
    pub call_type: Option<String>,
    pub call_id: Option<String>,
    pub has_assessment: bool,
    pub has_report: bool,
    pub error: Option<String>,
    pub join_url: Option<String>,
}
