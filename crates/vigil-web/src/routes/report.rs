//! Standalone report generation from a structured vitals summary.
//!
//! Not tied to a live session: the dashboard aggregates its simulated
//! frame metrics client-side and posts them here for a downloadable
//! document.

use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use vigil_report::{render_summary, ReportMeta, SessionSummary};

use crate::routes::agent::pdf_response;
use crate::state::AppState;
use crate::WebError;

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/api/generate-pdf", post(generate_pdf))
}

async fn generate_pdf(Json(summary): Json<SessionSummary>) -> Result<impl IntoResponse, WebError> {
    let meta = ReportMeta {
        generated_at: Utc::now(),
        session_started_at: None,
    };
    let bytes =
        render_summary(&summary, &meta).map_err(|e| WebError::Render(e.to_string()))?;
    tracing::info!(bytes = bytes.len(), "summary report generated");
    Ok(pdf_response(bytes))
}
