//! Deployment reconciliation.
//!
//! Ensures the cluster's group exists in Marathon. Create-only: a group that
//! already exists is never compared against or updated to the desired
//! descriptor.

use std::sync::Arc;

use amf_descriptor::{ClusterSpec, GroupDescriptor};
use amf_reconcile::{Fingerprint, PeriodicTask};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::error::FrameworkResult;
use crate::marathon::MarathonClient;

/// Outcome of a successful reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converged {
    /// The group was already present.
    AlreadyPresent,
    /// The group was submitted and accepted.
    Created,
}

/// Creates the cluster's group when it is missing.
pub struct DeploymentReconciler {
    client: MarathonClient,
    spec: Arc<ClusterSpec>,
}

impl DeploymentReconciler {
    pub fn new(client: MarathonClient, spec: Arc<ClusterSpec>) -> Self {
        Self { client, spec }
    }

    /// One GET, and a POST only when the group is absent.
    ///
    /// Errors are not retried here; the next tick calls again.
    #[instrument(skip(self, descriptor))]
    pub async fn reconcile(
        &self,
        group_id: &str,
        descriptor: &GroupDescriptor,
    ) -> FrameworkResult<Converged> {
        if self.client.group_exists(group_id).await? {
            debug!(group_id, "Group already deployed");
            return Ok(Converged::AlreadyPresent);
        }

        let fingerprint = serde_json::to_value(descriptor)
            .map(|json| Fingerprint::from_json(&json))
            .ok();
        info!(
            group_id,
            apps = descriptor.all_apps().len(),
            fingerprint = fingerprint.as_ref().map(Fingerprint::as_str),
            "Group missing, submitting descriptor"
        );

        self.client.create_group(descriptor).await?;

        info!(group_id, "Group created");
        Ok(Converged::Created)
    }
}

#[async_trait]
impl PeriodicTask for DeploymentReconciler {
    fn name(&self) -> &'static str {
        "deployment-reconciler"
    }

    async fn tick(&mut self) {
        let group_id = self.spec.group_id();
        let descriptor = GroupDescriptor::for_cluster(&self.spec);

        if let Err(e) = self.reconcile(&group_id, &descriptor).await {
            warn!(group_id = %group_id, error = %e, "Reconciliation failed, will retry next tick");
        }
    }
}
