//! Marathon REST API client.
//!
//! Provides the handful of orchestrator calls the framework needs:
//! - Looking up, creating and deleting the cluster's group
//! - Listing the live tasks of an app

use std::time::Duration;

use amf_descriptor::GroupDescriptor;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{FrameworkError, FrameworkResult};

/// Build the HTTP client shared by orchestrator and coordinator calls.
pub fn http_client(timeout: Duration) -> FrameworkResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .build()
        .map_err(FrameworkError::HttpClient)
}

/// Marathon API client.
#[derive(Debug, Clone)]
pub struct MarathonClient {
    client: reqwest::Client,
    base_url: String,
}

impl MarathonClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2{}", self.base_url, path)
    }

    /// Whether the group exists. Only HTTP 200 counts as present.
    pub async fn group_exists(&self, group_id: &str) -> FrameworkResult<bool> {
        let url = self.url(&format!("/groups{group_id}"));
        debug!(url = %url, "Looking up group");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FrameworkError::OrchestratorUnreachable)?;

        let status = response.status();
        debug!(group_id, status = %status, "Group lookup answered");
        Ok(status == StatusCode::OK)
    }

    /// Submit a new group. Only HTTP 201 counts as success.
    pub async fn create_group(&self, group: &GroupDescriptor) -> FrameworkResult<()> {
        let url = self.url("/groups");
        debug!(url = %url, group_id = %group.id, "Creating group");

        let response = self
            .client
            .post(&url)
            .json(group)
            .send()
            .await
            .map_err(FrameworkError::OrchestratorUnreachable)?;

        if response.status() != StatusCode::CREATED {
            return Err(rejected(response).await);
        }
        Ok(())
    }

    /// Delete the group and everything in it. Only HTTP 200 counts as success.
    pub async fn delete_group(&self, group_id: &str) -> FrameworkResult<()> {
        let url = self.url(&format!("/groups{group_id}"));
        debug!(url = %url, "Deleting group");

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(FrameworkError::OrchestratorUnreachable)?;

        if response.status() != StatusCode::OK {
            return Err(rejected(response).await);
        }
        Ok(())
    }

    /// List the live tasks of an app.
    ///
    /// Any non-2xx status, including 404 before the app exists, is an error.
    pub async fn app_tasks(&self, app_id: &str) -> FrameworkResult<Vec<DiscoveredTask>> {
        let url = self.url(&format!("/apps{app_id}"));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FrameworkError::OrchestratorUnreachable)?;

        // Expected while the app is still being deployed; retry logs it.
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(FrameworkError::OrchestratorUnreachable)?;
        parse_app_tasks(&body)
    }
}

async fn rejection(response: reqwest::Response) -> FrameworkError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    FrameworkError::OrchestratorRejected { status, body }
}

/// [`rejection`], logged at error level.
async fn rejected(response: reqwest::Response) -> FrameworkError {
    let status = response.status();
    let err = rejection(response).await;
    error!(status = %status, error = %err, "Marathon rejected request");
    err
}

/// One live instance of a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTask {
    host: String,
    ports: Vec<u16>,
    id: String,
    owner_id: String,
}

impl DiscoveredTask {
    /// Build a task. A host and at least one port are required.
    pub fn new(
        host: impl Into<String>,
        ports: Vec<u16>,
        id: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> FrameworkResult<Self> {
        let host = host.into();
        let id = id.into();
        if host.is_empty() {
            return Err(FrameworkError::MalformedTaskRecord(format!(
                "task {id} has an empty host"
            )));
        }
        if ports.is_empty() {
            return Err(FrameworkError::MalformedTaskRecord(format!(
                "task {id} has no ports"
            )));
        }
        Ok(Self {
            host,
            ports,
            id,
            owner_id: owner_id.into(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The agent the task runs on.
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// First assigned port; always present.
    pub fn primary_port(&self) -> u16 {
        self.ports[0]
    }
}

#[derive(Debug, Deserialize)]
struct AppEnvelope {
    app: AppStatus,
}

#[derive(Debug, Deserialize)]
struct AppStatus {
    #[serde(default)]
    tasks: Option<Vec<TaskRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    host: String,
    ports: Vec<u16>,
    id: String,
    // Older Marathon releases report `slaveId`, newer ones `agentId`, some both.
    slave_id: Option<String>,
    agent_id: Option<String>,
}

impl TaskRecord {
    fn into_task(self) -> FrameworkResult<DiscoveredTask> {
        let owner_id = self.slave_id.or(self.agent_id).ok_or_else(|| {
            FrameworkError::MalformedTaskRecord(format!(
                "task {} has neither slaveId nor agentId",
                self.id
            ))
        })?;
        DiscoveredTask::new(self.host, self.ports, self.id, owner_id)
    }
}

/// Decode an app status body into its tasks, preserving order.
///
/// Any task that does not match the schema fails the whole body.
pub fn parse_app_tasks(body: &str) -> FrameworkResult<Vec<DiscoveredTask>> {
    let envelope: AppEnvelope = serde_json::from_str(body)
        .map_err(|e| FrameworkError::MalformedTaskRecord(e.to_string()))?;

    envelope
        .app
        .tasks
        .unwrap_or_default()
        .into_iter()
        .map(TaskRecord::into_task)
        .collect()
}
