//! Framework error types.

use thiserror::Error;

/// Result type for orchestrator and coordinator calls.
pub type FrameworkResult<T> = Result<T, FrameworkError>;

/// Errors raised while talking to the orchestrator or a coordinator.
#[derive(Debug, Error)]
pub enum FrameworkError {
    /// The orchestrator could not be reached or the response could not be read.
    #[error("orchestrator unreachable: {0}")]
    OrchestratorUnreachable(#[source] reqwest::Error),

    /// The orchestrator answered with an unexpected status.
    #[error("orchestrator rejected request with status {status}: {body}")]
    OrchestratorRejected { status: u16, body: String },

    /// A task list did not match the expected schema.
    #[error("malformed task record: {0}")]
    MalformedTaskRecord(String),

    /// Task discovery used up its attempts.
    #[error("task discovery exhausted after {attempts} attempts")]
    DiscoveryExhausted { attempts: u32 },

    /// The coordinator could not be reached.
    #[error("coordinator unreachable: {0}")]
    CoordinatorUnreachable(#[source] reqwest::Error),

    /// The coordinator refused the sizing handshake.
    #[error("coordinator rejected handshake with status {status}: {body}")]
    CoordinatorRejected { status: u16, body: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
