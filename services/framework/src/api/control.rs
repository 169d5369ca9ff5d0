//! Liveness and shutdown endpoints.
//!
//! `/v2/status` only reports that the process is alive; it says nothing about
//! deployment or initialization progress.

use axum::{extract::State, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v2/status", get(status))
        .route("/v2/shutdown", post(shutdown))
}

async fn status() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

/// Delete the cluster's group, then stop the framework.
///
/// The signal is raised whether or not the delete succeeded; `ok` reports
/// the delete.
async fn shutdown(State(state): State<AppState>) -> Json<OkResponse> {
    let group_id = state.group_id();
    info!(group_id, "Got shutdown request, deleting Marathon group");

    let ok = match state.marathon().delete_group(group_id).await {
        Ok(()) => {
            info!(group_id, "Deleted Marathon group");
            true
        }
        Err(e) => {
            warn!(group_id, error = %e, "Failed to delete Marathon group");
            false
        }
    };

    state.signal_shutdown();
    Json(OkResponse { ok })
}
