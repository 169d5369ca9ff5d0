//! Task discovery with bounded retry.

use amf_reconcile::{retry_fixed, RetryOutcome, RetryPolicy};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::FrameworkError;
use crate::marathon::{DiscoveredTask, MarathonClient};

/// Polls Marathon for the live tasks of an app.
#[derive(Debug, Clone)]
pub struct TaskDiscovery {
    client: MarathonClient,
    policy: RetryPolicy,
    shutdown: watch::Receiver<bool>,
}

impl TaskDiscovery {
    pub fn new(client: MarathonClient, policy: RetryPolicy, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            client,
            policy,
            shutdown,
        }
    }

    /// Tasks of `app_id`, in the order Marathon reports them.
    ///
    /// Never fails: transport errors, rejections and malformed bodies are
    /// retried, and exhaustion or shutdown yield an empty list. Empty means
    /// "nothing known yet", not "no tasks".
    pub async fn discover(&self, app_id: &str) -> Vec<DiscoveredTask> {
        let mut shutdown = self.shutdown.clone();

        let outcome = retry_fixed("task discovery", self.policy, &mut shutdown, |_| {
            let client = self.client.clone();
            let app_id = app_id.to_string();
            async move { client.app_tasks(&app_id).await }
        })
        .await;

        match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                debug!(app_id, attempts, tasks = value.len(), "Discovered tasks");
                value
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                let exhausted = FrameworkError::DiscoveryExhausted { attempts };
                warn!(
                    app_id,
                    error = %exhausted,
                    last_error = last_error.as_ref().map(|e| e.to_string()),
                    "Giving up on task discovery for now"
                );
                Vec::new()
            }
            RetryOutcome::Cancelled { attempts, .. } => {
                debug!(app_id, attempts, "Task discovery interrupted by shutdown");
                Vec::new()
            }
        }
    }
}
