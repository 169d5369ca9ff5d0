//! Per-role app descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::spec::{ClusterSpec, Role};

/// Port every ArangoDB container listens on.
pub const ARANGODB_PORT: u16 = 8529;

const DATA_VOLUME: &str = "data";
const DATA_MOUNT_PATH: &str = "/var/lib/arangodb3";
const HEALTH_CHECK_PATH: &str = "/_api/version";

/// One orchestrator app: a homogeneous set of container instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDescriptor {
    pub id: String,
    pub cpus: f64,
    pub mem: u32,
    pub disk: u32,
    pub instances: u32,
    pub container: Container,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub health_checks: Vec<HealthCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residency: Option<Residency>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(rename = "type")]
    pub kind: String,
    pub docker: Docker,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Docker {
    pub image: String,
    pub network: String,
    pub force_pull_image: bool,
    pub port_mappings: Vec<PortMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub container_port: u16,
    /// Zero asks the orchestrator to assign a host port.
    pub host_port: u16,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,
    pub container_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent: Option<PersistentVolume>,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentVolume {
    /// Size in MiB.
    pub size: u32,
}

/// Placement constraint, serialized as `[field, operator]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint(pub String, pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub path: String,
    pub port_index: u32,
    pub protocol: String,
    pub grace_period_seconds: u32,
    pub interval_seconds: u32,
    pub timeout_seconds: u32,
    pub max_consecutive_failures: u32,
    pub ignore_http1xx: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Residency {
    pub relaunch_escalation_timeout_seconds: u32,
    pub task_lost_behavior: String,
}

/// Build the app descriptor for one role of the cluster.
pub fn build_app(spec: &ClusterSpec, role: Role) -> AppDescriptor {
    let limits = spec.limits(role);

    let mut port_mapping = PortMapping {
        container_port: ARANGODB_PORT,
        host_port: 0,
        protocol: "tcp".to_string(),
        labels: BTreeMap::new(),
        name: None,
    };
    if role == Role::Coordinator {
        port_mapping.labels.insert(
            "VIP_0".to_string(),
            format!("{}:{}", spec.name(), ARANGODB_PORT),
        );
        port_mapping.name = Some(spec.name().to_string());
    }

    let (volumes, constraints, residency) = if role.is_stateful() {
        (
            data_volumes(limits.disk_mb),
            vec![Constraint("hostname".to_string(), "UNIQUE".to_string())],
            Some(Residency {
                relaunch_escalation_timeout_seconds: 3600,
                task_lost_behavior: "WAIT_FOREVER".to_string(),
            }),
        )
    } else {
        (Vec::new(), Vec::new(), None)
    };

    let mut env = BTreeMap::new();
    env.insert(
        "AGENCY_SIZE".to_string(),
        spec.limits(Role::Agency).count.to_string(),
    );

    AppDescriptor {
        id: spec.app_id(role),
        cpus: limits.cpu,
        mem: limits.mem_mb,
        disk: limits.disk_mb,
        instances: limits.count,
        container: Container {
            kind: "DOCKER".to_string(),
            docker: Docker {
                image: spec.image().to_string(),
                network: "BRIDGE".to_string(),
                force_pull_image: false,
                port_mappings: vec![port_mapping],
            },
            volumes,
        },
        env,
        constraints,
        labels: BTreeMap::new(),
        health_checks: vec![HealthCheck {
            path: HEALTH_CHECK_PATH.to_string(),
            port_index: 0,
            protocol: "HTTP".to_string(),
            grace_period_seconds: 300,
            interval_seconds: 30,
            timeout_seconds: 5,
            max_consecutive_failures: 0,
            ignore_http1xx: false,
        }],
        residency,
    }
}

fn data_volumes(size_mb: u32) -> Vec<Volume> {
    vec![
        Volume {
            host_path: Some(DATA_VOLUME.to_string()),
            container_path: DATA_MOUNT_PATH.to_string(),
            persistent: None,
            mode: "RW".to_string(),
        },
        Volume {
            host_path: None,
            container_path: DATA_VOLUME.to_string(),
            persistent: Some(PersistentVolume { size: size_mb }),
            mode: "RW".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{RoleLimits, RoleSet};

    fn spec() -> ClusterSpec {
        let roles = RoleSet {
            agency: RoleLimits::new(0.5, 1024, 4096, 3),
            dbserver: RoleLimits::new(2.0, 8192, 16384, 4),
            coordinator: RoleLimits::new(1.5, 2048, 512, 2),
        };
        ClusterSpec::new("c1", "http://m:8080", roles).unwrap()
    }

    #[test]
    fn test_agency_app_is_stateful() {
        let app = build_app(&spec(), Role::Agency);

        assert_eq!(app.id, "/c1/agency/agents");
        assert_eq!(app.cpus, 0.5);
        assert_eq!(app.mem, 1024);
        assert_eq!(app.disk, 4096);
        assert_eq!(app.instances, 3);
        assert_eq!(app.container.volumes.len(), 2);
        assert_eq!(
            app.container.volumes[1].persistent,
            Some(PersistentVolume { size: 4096 })
        );
        assert_eq!(
            app.constraints,
            vec![Constraint("hostname".into(), "UNIQUE".into())]
        );
        assert!(app.residency.is_some());
        assert!(app.container.docker.port_mappings[0].labels.is_empty());
    }

    #[test]
    fn test_coordinator_app_gets_vip() {
        let app = build_app(&spec(), Role::Coordinator);

        assert_eq!(app.id, "/c1/servers/coordinators");
        assert!(app.container.volumes.is_empty());
        assert!(app.constraints.is_empty());
        assert!(app.residency.is_none());

        let mapping = &app.container.docker.port_mappings[0];
        assert_eq!(mapping.labels.get("VIP_0").map(String::as_str), Some("c1:8529"));
        assert_eq!(mapping.name.as_deref(), Some("c1"));
    }

    #[test]
    fn test_every_role_knows_agency_size() {
        let spec = spec();
        for role in Role::ALL {
            let app = build_app(&spec, role);
            assert_eq!(app.env.get("AGENCY_SIZE").map(String::as_str), Some("3"));
        }
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(build_app(&spec(), Role::DbServer)).unwrap();

        assert_eq!(json["container"]["type"], "DOCKER");
        assert_eq!(json["container"]["docker"]["forcePullImage"], false);
        assert_eq!(
            json["container"]["docker"]["portMappings"][0]["containerPort"],
            8529
        );
        assert_eq!(json["constraints"], serde_json::json!([["hostname", "UNIQUE"]]));
        assert_eq!(json["healthChecks"][0]["ignoreHttp1xx"], false);
        assert_eq!(json["residency"]["taskLostBehavior"], "WAIT_FOREVER");
        assert_eq!(json["labels"], serde_json::json!({}));
    }

    #[test]
    fn test_coordinator_omits_optional_fields() {
        let json = serde_json::to_value(build_app(&spec(), Role::Coordinator)).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("constraints"));
        assert!(!object.contains_key("residency"));
        assert!(!json["container"].as_object().unwrap().contains_key("volumes"));
    }
}
