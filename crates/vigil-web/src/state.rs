//! Shared state for the HTTP layer.

use std::sync::Arc;

use vigil_core::SessionManager;

/// Handler state: the process-wide session manager.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

impl AppState {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }
}
