//! HTTP API handlers and routing.

mod control;

pub use control::OkResponse;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the control-plane router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(control::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
