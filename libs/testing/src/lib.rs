//! Test fixtures: synthetic cluster specs and orchestrator response bodies.

use amf_descriptor::{ClusterSpec, RoleLimits, RoleSet};
use serde_json::{json, Value};

/// A cluster spec with default limits and the given instance counts.
pub fn cluster_spec(name: &str, marathon_url: &str, agents: u32, dbservers: u32, coordinators: u32) -> ClusterSpec {
    let roles = RoleSet {
        agency: RoleLimits {
            count: agents,
            ..RoleLimits::default()
        },
        dbserver: RoleLimits {
            count: dbservers,
            ..RoleLimits::default()
        },
        coordinator: RoleLimits {
            count: coordinators,
            ..RoleLimits::default()
        },
    };
    ClusterSpec::new(name, marathon_url, roles).expect("fixture cluster spec is valid")
}

/// A task record as the orchestrator reports it.
pub fn task(host: &str, ports: &[u16], id: &str, slave_id: &str) -> Value {
    json!({
        "id": id,
        "host": host,
        "ports": ports,
        "slaveId": slave_id,
        "appId": "/fixture",
        "stagedAt": "2016-10-16T10:00:00.000Z",
        "startedAt": "2016-10-16T10:00:05.000Z",
    })
}

/// An app status body wrapping the given task records.
pub fn app_body(app_id: &str, tasks: Vec<Value>) -> Value {
    json!({
        "app": {
            "id": app_id,
            "instances": tasks.len(),
            "tasksRunning": tasks.len(),
            "tasks": tasks,
        }
    })
}

/// The orchestrator's "unknown app" error body.
pub fn missing_app_body(app_id: &str) -> Value {
    json!({ "message": format!("App '{app_id}' does not exist") })
}
