//! Cluster initialization supervisor.
//!
//! Once coordinators are running, one of them is told how many coordinators
//! and dbservers the cluster is meant to have. The handshake is retried every
//! tick until a coordinator accepts it, and is never repeated afterwards.

use std::sync::Arc;

use amf_descriptor::{ClusterSpec, Role};
use amf_reconcile::PeriodicTask;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::discovery::TaskDiscovery;
use crate::error::{FrameworkError, FrameworkResult};
use crate::marathon::DiscoveredTask;

/// Initialization progress, owned by the supervision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    /// Terminal for the process lifetime.
    Initialized,
}

/// Intended cluster topology, sent to a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizingRequest {
    #[serde(rename = "numberOfCoordinators")]
    pub number_of_coordinators: u32,
    #[serde(rename = "numberOfDBServers")]
    pub number_of_db_servers: u32,
}

impl SizingRequest {
    pub fn from_spec(spec: &ClusterSpec) -> Self {
        Self {
            number_of_coordinators: spec.limits(Role::Coordinator).count,
            number_of_db_servers: spec.limits(Role::DbServer).count,
        }
    }
}

/// Client for a coordinator's admin API.
#[derive(Debug, Clone)]
pub struct CoordinatorAdmin {
    client: reqwest::Client,
}

impl CoordinatorAdmin {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// PUT the sizing to the task's first port. Only HTTP 200 is success.
    pub async fn set_number_of_servers(
        &self,
        task: &DiscoveredTask,
        sizing: &SizingRequest,
    ) -> FrameworkResult<()> {
        let url = format!(
            "http://{}:{}/_admin/cluster/numberOfServers",
            task.host(),
            task.primary_port()
        );
        debug!(url = %url, task_id = task.id(), "Sending sizing handshake");

        let response = self
            .client
            .put(&url)
            .json(sizing)
            .send()
            .await
            .map_err(FrameworkError::CoordinatorUnreachable)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FrameworkError::CoordinatorRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Drives the one-shot sizing handshake.
pub struct InitSupervisor {
    discovery: TaskDiscovery,
    admin: CoordinatorAdmin,
    coordinator_app: String,
    sizing: SizingRequest,
    state: InitState,
}

impl InitSupervisor {
    pub fn new(spec: Arc<ClusterSpec>, discovery: TaskDiscovery, admin: CoordinatorAdmin) -> Self {
        Self {
            discovery,
            admin,
            coordinator_app: spec.app_id(Role::Coordinator),
            sizing: SizingRequest::from_spec(&spec),
            state: InitState::Uninitialized,
        }
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    /// One supervision pass. No-op once initialized.
    pub async fn supervise(&mut self) -> InitState {
        if self.state == InitState::Initialized {
            return self.state;
        }

        let tasks = self.discovery.discover(&self.coordinator_app).await;
        let Some(task) = tasks.first() else {
            debug!(app_id = %self.coordinator_app, "No coordinator tasks yet");
            return self.state;
        };
        info!(
            app_id = %self.coordinator_app,
            coordinators = tasks.len(),
            task_id = task.id(),
            host = task.host(),
            port = task.primary_port(),
            "Coordinator found, sending cluster size"
        );

        match self.admin.set_number_of_servers(task, &self.sizing).await {
            Ok(()) => {
                self.state = InitState::Initialized;
                info!(
                    coordinators = self.sizing.number_of_coordinators,
                    dbservers = self.sizing.number_of_db_servers,
                    "Successfully initialized cluster"
                );
            }
            Err(e) => {
                warn!(task_id = task.id(), error = %e, "Cluster initialization failed, will retry next tick");
            }
        }

        self.state
    }
}

#[async_trait]
impl PeriodicTask for InitSupervisor {
    fn name(&self) -> &'static str {
        "init-supervisor"
    }

    async fn tick(&mut self) {
        self.supervise().await;
    }
}
