//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use call_simulator::SimulationTiming;
use profile_store::ProfileStore;

use crate::session::SessionRegistry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Record storage.
    pub store: Arc<dyn ProfileStore>,
    /// Live sessions.
    pub sessions: Arc<SessionRegistry>,
    /// Identity used when a request names none.
    pub default_user: Option<Arc<str>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        store: Arc<dyn ProfileStore>,
        timing: SimulationTiming,
        default_user: Option<String>,
        idle_timeout: Duration,
    ) -> Self {
        let sessions = SessionRegistry::new(store.clone(), timing).with_idle_timeout(idle_timeout);
        Self {
            sessions: Arc::new(sessions),
            store,
            default_user: default_user.map(Arc::from),
        }
    }
}
