//! WebSocket endpoint for the dashboard.
//!
//! One socket carries three flows: lifecycle events relayed from the
//! session broker, JSON control messages (start/stop/status) answered
//! in-line, and camera frames answered with a per-frame analysis payload.
//! The frame metrics are simulated placeholders — the real vision pipeline
//! lives with the vendor collaborator, not in this process.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use rand::seq::IndexedRandom;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vigil_core::{StartOutcome, StatusSnapshot};

use crate::routes::agent::start_response;
use crate::state::AppState;

const MOODS: &[&str] = &["Relaxed", "Neutral", "Focused", "Calm", "Alert"];
const GESTURES: &[&str] = &["Sitting", "Resting", "Leaning", "Upright"];

pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Single writer task; the event relay and the receive loop both feed it.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let relay_tx = tx.clone();
    let mut events = state.manager.events().subscribe();
    let relay = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if relay_tx.send(text).is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "dashboard client lagged behind the event stream");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!("dashboard client connected");
    let mut frames: u64 = 0;

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let reply = handle_text(&state, text.as_str(), &mut frames).await;
                if tx.send(reply).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "websocket receive error");
                break;
            }
        }
    }

    relay.abort();
    drop(tx);
    let _ = writer.await;
    info!(frames, "dashboard client disconnected");
}

#[derive(Debug, Deserialize)]
struct ControlMessage {
    #[serde(rename = "type")]
    kind: String,
    call_type: Option<String>,
    call_id: Option<String>,
}

/// Answer one inbound text frame: a control message, or a camera frame.
async fn handle_text(state: &AppState, text: &str, frames: &mut u64) -> String {
    if text.trim_start().starts_with('{') {
        if let Ok(control) = serde_json::from_str::<ControlMessage>(text) {
            match control.kind.as_str() {
                "start_agent" => {
                    let call_type = control.call_type.as_deref().unwrap_or("default");
                    let call_id = control.call_id.as_deref().unwrap_or("default");
                    let outcome = state.manager.start(call_type, call_id).await;
                    return control_reply(&outcome);
                }
                "stop_agent" => {
                    let snapshot = state.manager.stop().await;
                    return status_reply(&snapshot);
                }
                "get_status" => {
                    return status_reply(&state.manager.status().await);
                }
                _ => {}
            }
        }
    }

    // Anything else is treated as a frame from the camera loop.
    *frames += 1;
    let analysis = FrameAnalysis::simulated(state.manager.status().await);
    serde_json::to_string(&analysis).unwrap_or_else(|_| "{}".to_string())
}

fn status_reply(snapshot: &StatusSnapshot) -> String {
    let mut body = serde_json::to_value(snapshot).unwrap_or_else(|_| json!({}));
    body["type"] = json!("agent_status");
    body.to_string()
}

fn control_reply(outcome: &StartOutcome) -> String {
    let mut body: Value = start_response(outcome);
    body["type"] = json!("agent_status");
    body.to_string()
}

/// Per-frame analysis payload sent back to the dashboard.
#[derive(Debug, Serialize)]
struct FrameAnalysis {
    #[serde(rename = "type")]
    kind: &'static str,
    heart_rate_bpm: u32,
    respiratory_rate_bpm: u32,
    tremor_index: f64,
    mood: &'static str,
    gesture: &'static str,
    confidence: f64,
    status: &'static str,
    conditions: Vec<String>,
    agent: StatusSnapshot,
}

impl FrameAnalysis {
    /// Simulated placeholder metrics; swap for a real pipeline when one
    /// exists.
    fn simulated(agent: StatusSnapshot) -> Self {
        let mut rng = rand::rng();
        let heart_rate = rng.random_range(62..=88);
        let respiratory_rate = rng.random_range(12..=20);
        let tremor = round_to(rng.random_range(0.001..0.05), 3);
        let confidence = round_to(rng.random_range(0.85..0.98), 2);

        let mut conditions = vec!["No obvious symptoms detected.".to_string()];
        if heart_rate > 82 {
            conditions = vec!["Slightly elevated heart rate noted.".to_string()];
        }
        if tremor > 0.04 {
            conditions.push("Minor tremor detected in upper body.".to_string());
        }

        Self {
            kind: "frame_analysis",
            heart_rate_bpm: heart_rate,
            respiratory_rate_bpm: respiratory_rate,
            tremor_index: tremor,
            mood: MOODS.choose(&mut rng).copied().unwrap_or("Neutral"),
            gesture: GESTURES.choose(&mut rng).copied().unwrap_or("Sitting"),
            confidence,
            status: if heart_rate > 85 { "elevated" } else { "normal" },
            conditions,
            agent,
        }
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vigil_core::test_support::{Script, ScriptedFactory};
    use vigil_core::SessionManager;

    fn app_state() -> AppState {
        AppState::new(Arc::new(SessionManager::new(ScriptedFactory::new(
            Script::happy(),
        ))))
    }

    #[tokio::test]
    async fn get_status_control_message_answers_with_a_snapshot() {
        let state = app_state();
        let mut frames = 0;

        let reply = handle_text(&state, r#"{"type":"get_status"}"#, &mut frames).await;
        let body: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(body["type"], "agent_status");
        assert_eq!(body["status"], "idle");
        assert_eq!(frames, 0);
    }

    #[tokio::test]
    async fn camera_frames_get_a_frame_analysis() {
        let state = app_state();
        let mut frames = 0;

        let reply = handle_text(&state, "data:image/jpeg;base64,AAAA", &mut frames).await;
        let body: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(body["type"], "frame_analysis");
        assert_eq!(frames, 1);

        let hr = body["heart_rate_bpm"].as_u64().unwrap();
        assert!((62..=88).contains(&hr));
        assert!(body["agent"]["status"].is_string());
        assert!(body["conditions"].as_array().is_some());
    }

    #[tokio::test]
    async fn unknown_json_is_treated_as_a_frame() {
        let state = app_state();
        let mut frames = 0;

        let reply = handle_text(&state, r#"{"type":"mystery"}"#, &mut frames).await;
        let body: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(body["type"], "frame_analysis");
        assert_eq!(frames, 1);
    }

    #[tokio::test]
    async fn start_and_stop_control_messages_drive_the_session() {
        let state = app_state();
        let mut frames = 0;

        let reply = handle_text(
            &state,
            r#"{"type":"start_agent","call_type":"demo","call_id":"room1"}"#,
            &mut frames,
        )
        .await;
        let body: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(body["type"], "agent_status");
        assert_eq!(body["status"], "running");
        assert_eq!(body["call_id"], "room1");

        let reply = handle_text(&state, r#"{"type":"stop_agent"}"#, &mut frames).await;
        let body: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(body["status"], "stopped");
    }
}
