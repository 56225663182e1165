//! Router assembly and server startup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use vigil_core::{ServerConfig, SessionManager};

use crate::routes::{agent_routes, health_routes, report_routes};
use crate::state::AppState;
use crate::ws::ws_routes;
use crate::{Result, WebError};

/// Build the full application router around one session manager.
pub fn app(manager: Arc<SessionManager>) -> Router {
    let state = AppState::new(manager);

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            "http://localhost:3000".parse().unwrap(),
            "http://localhost:5173".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
            "http://127.0.0.1:5173".parse().unwrap(),
        ]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(agent_routes())
        .merge(report_routes())
        .merge(ws_routes())
        .with_state(state)
        .merge(health_routes())
        .layer(cors)
}

/// Bind and serve until the process exits.
pub async fn start_server(config: &ServerConfig, manager: Arc<SessionManager>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| WebError::Config(format!("{e}")))?;

    tracing::info!("Starting web server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(WebError::Io)?;

    axum::serve(listener, app(manager))
        .await
        .map_err(WebError::Io)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::test_support::{Script, ScriptedFactory};

    #[tokio::test]
    async fn router_assembles() {
        let manager = Arc::new(SessionManager::new(ScriptedFactory::new(Script::happy())));
        let _router = app(manager);
    }

    #[test]
    fn bad_addresses_are_config_errors() {
        let config = ServerConfig {
            host: "not an address".into(),
            port: 8000,
        };
        let err = tokio_test::block_on(start_server(
            &config,
            Arc::new(SessionManager::new(ScriptedFactory::new(Script::happy()))),
        ))
        .unwrap_err();
        assert!(matches!(err, WebError::Config(_)));
    }
}
