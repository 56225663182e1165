//! Agent lifecycle endpoints.
//!
//! Thin projections over [`vigil_core::SessionManager`]: start/launch/stop
//! plus the status, assessment, and report queries the dashboard polls.

use std::time::Duration;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use vigil_core::{SessionStatus, StartOutcome, StatusSnapshot};

use crate::state::AppState;
use crate::WebError;

/// How long `/api/agent/launch` waits for the join URL.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Bounded wait for `stop()`, so a hung collaborator cannot pin a request.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

pub fn agent_routes() -> Router<AppState> {
    Router::new()
        .route("/api/agent/start", post(start_agent))
        .route("/api/agent/launch", post(launch_agent))
        .route("/api/agent/stop", post(stop_agent))
        .route("/api/agent/status", get(agent_status))
        .route("/api/agent/assessment", get(agent_assessment))
        .route("/api/agent/report", get(agent_report))
}

#[derive(Debug, Deserialize)]
pub struct StartAgentRequest {
    #[serde(default = "default_identifier")]
    pub call_type: String,
    #[serde(default = "default_identifier")]
    pub call_id: String,
}

fn default_identifier() -> String {
    "default".to_string()
}

fn snapshot_json(snapshot: &StatusSnapshot) -> Value {
    serde_json::to_value(snapshot).unwrap_or_else(|_| json!({}))
}

/// Snapshot plus an advisory `error` field for rejected starts.
pub(crate) fn start_response(outcome: &StartOutcome) -> Value {
    let mut body = snapshot_json(outcome.snapshot());
    if outcome.rejected() {
        body["error"] = json!("Agent is already running");
    }
    body
}

async fn start_agent(
    State(state): State<AppState>,
    Json(req): Json<StartAgentRequest>,
) -> Json<Value> {
    let outcome = state.manager.start(&req.call_type, &req.call_id).await;
    Json(start_response(&outcome))
}

/// Start the agent (when needed) and return the join URL so the frontend
/// can drop the human into the same call.
async fn launch_agent(
    State(state): State<AppState>,
    Json(req): Json<StartAgentRequest>,
) -> Result<Json<Value>, WebError> {
    let snapshot = state.manager.status().await;
    match snapshot.status {
        SessionStatus::Running if snapshot.join_url.is_some() => {
            return Ok(Json(snapshot_json(&snapshot)));
        }
        SessionStatus::Running => {}
        _ => {
            let outcome = state.manager.start(&req.call_type, &req.call_id).await;
            if let StartOutcome::Failed(snap) = &outcome {
                let message = snap
                    .error
                    .clone()
                    .unwrap_or_else(|| "Failed to start agent".to_string());
                return Err(WebError::Agent(message));
            }
        }
    }

    match state.manager.wait_for_join_url(LAUNCH_TIMEOUT).await {
        Some(_) => Ok(Json(snapshot_json(&state.manager.status().await))),
        None => {
            // Distinguish a failed session from a genuinely slow edge.
            let snapshot = state.manager.status().await;
            if let Some(error) = snapshot.error {
                Err(WebError::Agent(error))
            } else {
                Err(WebError::JoinUrlTimeout)
            }
        }
    }
}

async fn stop_agent(State(state): State<AppState>) -> Json<Value> {
    match tokio::time::timeout(STOP_TIMEOUT, state.manager.stop()).await {
        Ok(snapshot) => Json(snapshot_json(&snapshot)),
        Err(_) => {
            tracing::warn!("stop timed out, agent still unwinding");
            let mut body = snapshot_json(&state.manager.status().await);
            body["error"] = json!("Stop requested; the agent is still unwinding");
            Json(body)
        }
    }
}

async fn agent_status(State(state): State<AppState>) -> Json<Value> {
    Json(snapshot_json(&state.manager.status().await))
}

async fn agent_assessment(State(state): State<AppState>) -> Json<Value> {
    let assessment = state.manager.assessment().await;
    Json(json!({
        "has_assessment": assessment.is_some(),
        "assessment": assessment,
    }))
}

/// Download the session report, or an explicit not-ready answer.
async fn agent_report(State(state): State<AppState>) -> Result<impl IntoResponse, WebError> {
    let Some(bytes) = state.manager.report().await else {
        return Err(WebError::ReportNotReady);
    };
    Ok(pdf_response(bytes))
}

pub(crate) fn pdf_response(bytes: Vec<u8>) -> impl IntoResponse {
    let filename = format!(
        "Vigil_Report_{}.pdf",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vigil_core::test_support::{Script, ScriptedFactory};
    use vigil_core::SessionManager;

    fn app_state(factory: Arc<ScriptedFactory>) -> AppState {
        AppState::new(Arc::new(SessionManager::new(factory)))
    }

    #[tokio::test]
    async fn status_route_reports_idle_initially() {
        let state = app_state(ScriptedFactory::new(Script::happy()));
        let Json(body) = agent_status(State(state)).await;
        assert_eq!(body["status"], "idle");
        assert_eq!(body["has_assessment"], false);
    }

    #[tokio::test]
    async fn start_rejection_adds_the_advisory_error() {
        let state = app_state(ScriptedFactory::new(
            Script::happy().halt_at(vigil_core::test_support::Milestone::Greet),
        ));
        let req = || StartAgentRequest {
            call_type: "default".into(),
            call_id: "room1".into(),
        };

        let Json(first) = start_agent(State(state.clone()), Json(req())).await;
        assert_eq!(first["status"], "running");
        assert!(first["error"].is_null());

        let Json(second) = start_agent(State(state.clone()), Json(req())).await;
        assert_eq!(second["error"], "Agent is already running");
        assert_eq!(second["call_id"], "room1");

        state.manager.stop().await;
    }

    #[tokio::test]
    async fn report_route_is_explicit_about_not_ready() {
        let state = app_state(ScriptedFactory::new(Script::happy()));
        let err = agent_report(State(state)).await.err().unwrap();
        assert!(matches!(err, WebError::ReportNotReady));
    }

    #[tokio::test]
    async fn launch_returns_the_join_url() {
        let state = app_state(ScriptedFactory::new(Script::happy()));
        let Json(body) = launch_agent(
            State(state.clone()),
            Json(StartAgentRequest {
                call_type: "demo".into(),
                call_id: "room1".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(body["join_url"], Script::happy().join_url);
        state.manager.stop().await;
    }

    #[tokio::test]
    async fn stop_route_returns_a_snapshot() {
        let state = app_state(ScriptedFactory::new(Script::happy()));
        let Json(body) = stop_agent(State(state)).await;
        assert_eq!(body["status"], "stopped");
    }
}
