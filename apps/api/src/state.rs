use std::sync::Arc;

use crate::session::Session;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single analysis session; every handler observes and mutates the same one.
    pub session: Arc<Session>,
}
