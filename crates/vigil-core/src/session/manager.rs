//! The session manager and the background task that drives a session.
//!
//! One `SessionManager` instance exists per process. `start()` rejects
//! (never queues) while a session is running; `stop()` cancels the driving
//! task cooperatively and waits for it to unwind. The driving task walks a
//! fixed milestone sequence against the collaborator, publishing an event
//! at each step and writing its results into the shared [`SessionState`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use vigil_report::ReportMeta;

use crate::events::{AgentEvent, AgentPhase, EventBroker};
use crate::session::{JoinUrlState, SessionState, SessionStatus, StatusSnapshot};
use crate::traits::{AgentFactory, AgentSession};

/// Window the driving task gets to tear the call down after a failure or
/// cancellation.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const GREETING: &str = "Hello! I'm your AI Wellness Assistant. \
    Please sit upright facing the camera. \
    I'll observe for a few seconds and then share my wellness feedback.";

const ASSESSMENT_PROMPT: &str = "Please analyze the patient's posture, \
    breathing pattern, and any visible health indicators from the video feed. \
    Provide a complete wellness assessment in standard text format.";

const WRAP_UP: &str = "I have completed my assessment. \
    A summary report is being generated for you now.";

/// Result of a `start()` request.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// A new session was started; the driving task is running.
    Started(StatusSnapshot),
    /// A session is already running; its snapshot is returned unchanged.
    AlreadyRunning(StatusSnapshot),
    /// Constructing the collaborator failed; the session is in `error`.
    Failed(StatusSnapshot),
}

impl StartOutcome {
    pub fn snapshot(&self) -> &StatusSnapshot {
        match self {
            Self::Started(s) | Self::AlreadyRunning(s) | Self::Failed(s) => s,
        }
    }

    /// True when the request was refused because a session was active.
    pub fn rejected(&self) -> bool {
        matches!(self, Self::AlreadyRunning(_))
    }
}

struct DriverHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the single session's state and driving task.
///
/// Single-instance-per-process contract: all endpoints share one manager
/// (typically behind an `Arc`). Multi-session support would key the state
/// by session id in a concurrent map instead; this service deliberately
/// keeps the one-session invariant of the wellness-check demo.
pub struct SessionManager {
    state: Arc<RwLock<SessionState>>,
    events: EventBroker,
    factory: Arc<dyn AgentFactory>,
    // Guards start/stop against each other; the slot holds the live task.
    driver: Mutex<Option<DriverHandle>>,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::new())),
            events: EventBroker::new(),
            factory,
            driver: Mutex::new(None),
        }
    }

    /// The broker carrying this manager's lifecycle events.
    pub fn events(&self) -> EventBroker {
        self.events.clone()
    }

    /// Start a session, rejecting if one is already running.
    ///
    /// Returns as soon as the driving task is spawned; callers that need
    /// the join URL await it separately via [`Self::wait_for_join_url`].
    pub async fn start(&self, call_type: &str, call_id: &str) -> StartOutcome {
        let mut driver = self.driver.lock().await;

        {
            let state = self.state.read().await;
            if state.status == SessionStatus::Running {
                warn!(
                    call_type = %call_type,
                    call_id = %call_id,
                    "start rejected, a session is already running"
                );
                return StartOutcome::AlreadyRunning(state.snapshot());
            }
        }

        // Reap the previous session's task, if it ended on its own.
        if let Some(old) = driver.take() {
            old.cancel.cancel();
            let _ = old.handle.await;
        }

        {
            let mut state = self.state.write().await;
            state.reset_for(call_type.to_string(), call_id.to_string());
        }

        let agent = match self.factory.create() {
            Ok(agent) => agent,
            Err(e) => {
                let mut state = self.state.write().await;
                state.status = SessionStatus::Error;
                state.error_message = Some(e.to_string());
                error!(error = %e, "failed to construct the agent collaborator");
                return StartOutcome::Failed(state.snapshot());
            }
        };

        let snapshot = {
            let mut state = self.state.write().await;
            state.status = SessionStatus::Running;
            state.snapshot()
        };

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(drive_session(
            agent,
            call_type.to_string(),
            call_id.to_string(),
            self.state.clone(),
            self.events.clone(),
            cancel.clone(),
        ));
        *driver = Some(DriverHandle { cancel, handle });

        info!(call_type = %call_type, call_id = %call_id, "agent session started");
        StartOutcome::Started(snapshot)
    }

    /// Stop the session, waiting for the driving task to unwind.
    ///
    /// Idempotent; from `idle` it simply reports `stopped`. The HTTP layer
    /// wraps this call in a bounded timeout so a hung collaborator cannot
    /// block a request forever.
    pub async fn stop(&self) -> StatusSnapshot {
        let mut driver = self.driver.lock().await;

        if let Some(active) = driver.take() {
            if !active.handle.is_finished() {
                self.state.write().await.status = SessionStatus::Stopping;
            }
            active.cancel.cancel();
            if let Err(e) = active.handle.await {
                warn!(error = %e, "driving task ended abnormally");
            }
        }

        let snapshot = {
            let mut state = self.state.write().await;
            state.status = SessionStatus::Stopped;
            state.snapshot()
        };
        self.events.emit(AgentEvent::AgentStopped);
        info!("agent stopped");
        snapshot
    }

    /// Read-only projection of the current session state.
    pub async fn status(&self) -> StatusSnapshot {
        self.state.read().await.snapshot()
    }

    /// The last captured assessment text, verbatim.
    pub async fn assessment(&self) -> Option<String> {
        self.state.read().await.last_assessment.clone()
    }

    /// The rendered report for the last session, if one exists.
    pub async fn report(&self) -> Option<Vec<u8>> {
        self.state.read().await.report.clone()
    }

    /// Await the current session's join URL.
    ///
    /// Returns `None` on timeout, or when the session fails (or was never
    /// started) — waiters are always unblocked, never left hanging.
    pub async fn wait_for_join_url(&self, timeout: Duration) -> Option<String> {
        let mut gate = self.state.read().await.subscribe_join_gate();
        let ready = tokio::time::timeout(
            timeout,
            gate.wait_for(|state| !matches!(state, JoinUrlState::Pending)),
        )
        .await;
        match ready {
            Ok(Ok(state)) => match &*state {
                JoinUrlState::Ready(url) => Some(url.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

enum DriveEnd {
    Cancelled,
    Failed(String),
}

/// Run one collaborator call with cancellation checked first.
async fn step<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = crate::error::AgentResult<T>>,
) -> Result<T, DriveEnd> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DriveEnd::Cancelled),
        result = fut => result.map_err(|e| DriveEnd::Failed(e.to_string())),
    }
}

/// Background task: walk the milestone sequence, then settle terminal state.
async fn drive_session(
    mut agent: Box<dyn AgentSession>,
    call_type: String,
    call_id: String,
    state: Arc<RwLock<SessionState>>,
    events: EventBroker,
    cancel: CancellationToken,
) {
    let outcome = run_milestones(
        agent.as_mut(),
        &call_type,
        &call_id,
        &state,
        &events,
        &cancel,
    )
    .await;

    match outcome {
        Ok(()) => {
            render_report(&state, &events).await;
            state.write().await.status = SessionStatus::Stopped;
            events.emit(AgentEvent::AgentStatus {
                status: AgentPhase::Finished,
            });
            info!(call_type = %call_type, call_id = %call_id, "agent session finished");
        }
        Err(DriveEnd::Cancelled) => {
            // The token is already tripped, so teardown gets its own window.
            let _ = tokio::time::timeout(TEARDOWN_TIMEOUT, agent.finish()).await;
            state.write().await.status = SessionStatus::Stopped;
            debug!("agent session cancelled");
        }
        Err(DriveEnd::Failed(message)) => {
            let _ = tokio::time::timeout(TEARDOWN_TIMEOUT, agent.finish()).await;
            {
                let mut s = state.write().await;
                s.status = SessionStatus::Error;
                s.error_message = Some(message.clone());
                s.unblock_join_waiters();
            }
            error!(error = %message, "agent session failed");
            events.emit(AgentEvent::AgentError { error: message });
        }
    }
}

async fn run_milestones(
    agent: &mut dyn AgentSession,
    call_type: &str,
    call_id: &str,
    state: &Arc<RwLock<SessionState>>,
    events: &EventBroker,
    cancel: &CancellationToken,
) -> Result<(), DriveEnd> {
    events.emit(AgentEvent::AgentStatus {
        status: AgentPhase::CreatingCall,
    });

    step(cancel, agent.create_user()).await?;

    let url = step(cancel, agent.demo_join_url(call_type, call_id)).await?;
    state.write().await.publish_join_url(&url);
    info!(url = %url, "join url ready");
    events.emit(AgentEvent::JoinUrl { url });

    events.emit(AgentEvent::AgentStatus {
        status: AgentPhase::JoiningCall,
    });
    let call = step(cancel, agent.create_call(call_type, call_id)).await?;
    step(cancel, agent.join(&call)).await?;
    events.emit(AgentEvent::AgentStatus {
        status: AgentPhase::InCall,
    });

    step(cancel, agent.simple_response(GREETING)).await?;
    events.emit(AgentEvent::AgentStatus {
        status: AgentPhase::Analyzing,
    });

    let assessment = step(cancel, agent.simple_response(ASSESSMENT_PROMPT)).await?;
    let assessment = assessment.filter(|text| !text.trim().is_empty());
    state.write().await.last_assessment = assessment.clone();
    events.emit(AgentEvent::Assessment { data: assessment });

    step(cancel, agent.simple_response(WRAP_UP)).await?;
    step(cancel, agent.finish()).await?;

    Ok(())
}

/// Render the captured assessment into a report.
///
/// A render failure leaves the assessment intact and the report absent;
/// observation and report generation are independent success domains.
async fn render_report(state: &Arc<RwLock<SessionState>>, events: &EventBroker) {
    let (text, meta) = {
        let s = state.read().await;
        let Some(text) = s.last_assessment.clone() else {
            return;
        };
        (
            text,
            ReportMeta {
                generated_at: Utc::now(),
                session_started_at: s.started_at,
            },
        )
    };

    match vigil_report::render_assessment(&text, &meta) {
        Ok(bytes) => {
            info!(bytes = bytes.len(), "report rendered");
            state.write().await.report = Some(bytes);
            events.emit(AgentEvent::ReportReady);
        }
        Err(e) => warn!(error = %e, "report rendering failed"),
    }
}
