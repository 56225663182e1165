//! Health check endpoints

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "vigil-web",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ready_check() -> Json<Value> {
    // The session manager is constructed before the router, so a served
    // request implies readiness.
    Json(json!({
        "status": "ready"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_the_service_name() {
        let Json(body) = health_check().await;
        assert_eq!(body["service"], "vigil-web");
        assert_eq!(body["status"], "healthy");
    }
}
