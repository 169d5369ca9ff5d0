//! Shared state for the control-plane API.

use std::sync::Arc;

use tokio::sync::watch;

use crate::marathon::MarathonClient;

/// Handler state: the orchestrator client, the group to tear down, and the
/// process-wide shutdown signal.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    marathon: MarathonClient,
    group_id: String,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(marathon: MarathonClient, group_id: impl Into<String>, shutdown: watch::Sender<bool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                marathon,
                group_id: group_id.into(),
                shutdown,
            }),
        }
    }

    pub fn marathon(&self) -> &MarathonClient {
        &self.inner.marathon
    }

    pub fn group_id(&self) -> &str {
        &self.inner.group_id
    }

    /// Raise the shutdown signal for every loop and the server.
    pub fn signal_shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }
}
