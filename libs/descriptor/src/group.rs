//! Aggregate group descriptor.

use serde::{Deserialize, Serialize};

use crate::app::{build_app, AppDescriptor};
use crate::spec::{ClusterSpec, Role};

/// An orchestrator group: nested groups and apps under one id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<AppDescriptor>,
}

impl GroupDescriptor {
    /// Assemble the full cluster deployment.
    ///
    /// The servers sub-group depends on the agency sub-group, so the
    /// orchestrator starts agents before dbservers and coordinators.
    pub fn for_cluster(spec: &ClusterSpec) -> Self {
        let agency_id = spec.subgroup_id(Role::Agency);

        let agency = GroupDescriptor {
            id: agency_id.clone(),
            dependencies: Vec::new(),
            groups: Vec::new(),
            apps: vec![build_app(spec, Role::Agency)],
        };

        let servers = GroupDescriptor {
            id: spec.subgroup_id(Role::DbServer),
            dependencies: vec![agency_id],
            groups: Vec::new(),
            apps: vec![
                build_app(spec, Role::DbServer),
                build_app(spec, Role::Coordinator),
            ],
        };

        GroupDescriptor {
            id: spec.group_id(),
            dependencies: Vec::new(),
            groups: vec![agency, servers],
            apps: Vec::new(),
        }
    }

    /// All apps in this group and its sub-groups, depth first.
    pub fn all_apps(&self) -> Vec<&AppDescriptor> {
        let mut apps: Vec<&AppDescriptor> = self.apps.iter().collect();
        for group in &self.groups {
            apps.extend(group.all_apps());
        }
        apps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{RoleLimits, RoleSet};

    fn spec() -> ClusterSpec {
        let roles = RoleSet {
            agency: RoleLimits::new(1.0, 2048, 2048, 3),
            dbserver: RoleLimits::new(1.0, 2048, 2048, 2),
            coordinator: RoleLimits::new(1.0, 2048, 2048, 2),
        };
        ClusterSpec::new("c1", "http://m:8080", roles).unwrap()
    }

    #[test]
    fn test_group_layout() {
        let group = GroupDescriptor::for_cluster(&spec());

        assert_eq!(group.id, "/c1");
        assert!(group.apps.is_empty());
        assert_eq!(group.groups.len(), 2);

        let agency = &group.groups[0];
        assert_eq!(agency.id, "/c1/agency");
        assert!(agency.dependencies.is_empty());
        assert_eq!(agency.apps.len(), 1);

        let servers = &group.groups[1];
        assert_eq!(servers.id, "/c1/servers");
        assert_eq!(servers.dependencies, vec!["/c1/agency".to_string()]);
        let ids: Vec<_> = servers.apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["/c1/servers/dbservers", "/c1/servers/coordinators"]);
    }

    #[test]
    fn test_instance_counts_per_role() {
        let group = GroupDescriptor::for_cluster(&spec());
        let counts: Vec<_> = group
            .all_apps()
            .iter()
            .map(|a| (a.id.as_str(), a.instances))
            .collect();

        assert_eq!(
            counts,
            [
                ("/c1/agency/agents", 3),
                ("/c1/servers/dbservers", 2),
                ("/c1/servers/coordinators", 2),
            ]
        );
    }

    #[test]
    fn test_serialization_is_byte_identical() {
        let spec = spec();
        let first = serde_json::to_vec(&GroupDescriptor::for_cluster(&spec)).unwrap();
        for _ in 0..10 {
            let again = serde_json::to_vec(&GroupDescriptor::for_cluster(&spec)).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_parses_back() {
        let group = GroupDescriptor::for_cluster(&spec());
        let json = serde_json::to_string(&group).unwrap();
        let parsed: GroupDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, group);
    }
}
