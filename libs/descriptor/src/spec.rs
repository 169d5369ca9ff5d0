//! Immutable cluster configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Container image used when none is configured.
pub const DEFAULT_IMAGE: &str = "neunhoef/arangodb-marathon";

/// Errors raised while validating a cluster specification.
#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    /// The cluster name cannot be used as an orchestrator path segment.
    #[error("invalid cluster name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The orchestrator base URL is not an http(s) URL.
    #[error("invalid orchestrator url {0:?}: expected http:// or https://")]
    InvalidUrl(String),

    /// A role's resource limits are out of range.
    #[error("invalid limits for {role}: {reason}")]
    InvalidLimits { role: Role, reason: &'static str },
}

/// One of the three homogeneous instance sets of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Agency,
    DbServer,
    Coordinator,
}

impl Role {
    /// All roles, in deployment order.
    pub const ALL: [Role; 3] = [Role::Agency, Role::DbServer, Role::Coordinator];

    /// Sub-group the role's app lives in.
    pub fn group(self) -> &'static str {
        match self {
            Role::Agency => "agency",
            Role::DbServer | Role::Coordinator => "servers",
        }
    }

    /// App name within the sub-group.
    pub fn app(self) -> &'static str {
        match self {
            Role::Agency => "agents",
            Role::DbServer => "dbservers",
            Role::Coordinator => "coordinators",
        }
    }

    /// Whether instances keep data on a persistent volume and are pinned to it.
    pub fn is_stateful(self) -> bool {
        !matches!(self, Role::Coordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Agency => write!(f, "agency"),
            Role::DbServer => write!(f, "dbserver"),
            Role::Coordinator => write!(f, "coordinator"),
        }
    }
}

/// Resource limits and instance count for one role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleLimits {
    pub cpu: f64,
    pub mem_mb: u32,
    pub disk_mb: u32,
    pub count: u32,
}

impl RoleLimits {
    pub fn new(cpu: f64, mem_mb: u32, disk_mb: u32, count: u32) -> Self {
        Self {
            cpu,
            mem_mb,
            disk_mb,
            count,
        }
    }

    fn validate(&self, role: Role) -> Result<(), SpecError> {
        let reason = if !(self.cpu.is_finite() && self.cpu > 0.0) {
            "cpu must be a positive number"
        } else if self.mem_mb == 0 {
            "memory must be positive"
        } else if self.disk_mb == 0 {
            "disk must be positive"
        } else if self.count == 0 {
            "count must be at least 1"
        } else {
            return Ok(());
        };
        Err(SpecError::InvalidLimits { role, reason })
    }
}

impl Default for RoleLimits {
    fn default() -> Self {
        Self::new(1.0, 2048, 2048, 1)
    }
}

/// Limits for all three roles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleSet {
    pub agency: RoleLimits,
    pub dbserver: RoleLimits,
    pub coordinator: RoleLimits,
}

impl RoleSet {
    pub fn get(&self, role: Role) -> &RoleLimits {
        match role {
            Role::Agency => &self.agency,
            Role::DbServer => &self.dbserver,
            Role::Coordinator => &self.coordinator,
        }
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self {
            agency: RoleLimits {
                count: 3,
                ..RoleLimits::default()
            },
            dbserver: RoleLimits {
                count: 2,
                ..RoleLimits::default()
            },
            coordinator: RoleLimits {
                count: 2,
                ..RoleLimits::default()
            },
        }
    }
}

/// Process-lifetime cluster configuration.
///
/// Constructed once at startup and shared read-only by every component.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSpec {
    name: String,
    marathon_url: String,
    image: String,
    roles: RoleSet,
}

impl ClusterSpec {
    /// Validate and build a spec.
    ///
    /// A single leading `/` on the name is accepted and stripped; a trailing
    /// `/` on the URL is removed.
    pub fn new(
        name: impl Into<String>,
        marathon_url: impl Into<String>,
        roles: RoleSet,
    ) -> Result<Self, SpecError> {
        let name = name.into();
        let name = name.strip_prefix('/').unwrap_or(&name).to_string();
        validate_name(&name)?;

        let marathon_url = marathon_url.into();
        if !(marathon_url.starts_with("http://") || marathon_url.starts_with("https://")) {
            return Err(SpecError::InvalidUrl(marathon_url));
        }
        let marathon_url = marathon_url.trim_end_matches('/').to_string();

        for role in Role::ALL {
            roles.get(role).validate(role)?;
        }

        Ok(Self {
            name,
            marathon_url,
            image: DEFAULT_IMAGE.to_string(),
            roles,
        })
    }

    /// Override the container image.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marathon_url(&self) -> &str {
        &self.marathon_url
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn limits(&self, role: Role) -> &RoleLimits {
        self.roles.get(role)
    }

    /// Orchestrator id of the cluster's top-level group, e.g. `/c1`.
    pub fn group_id(&self) -> String {
        format!("/{}", self.name)
    }

    /// Orchestrator id of a role's sub-group, e.g. `/c1/servers`.
    pub fn subgroup_id(&self, role: Role) -> String {
        format!("/{}/{}", self.name, role.group())
    }

    /// Orchestrator id of a role's app, e.g. `/c1/servers/coordinators`.
    pub fn app_id(&self, role: Role) -> String {
        format!("{}/{}", self.subgroup_id(role), role.app())
    }
}

fn validate_name(name: &str) -> Result<(), SpecError> {
    let invalid = |reason| SpecError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let (Some(first), Some(last)) = (name.chars().next(), name.chars().last()) else {
        return Err(invalid("must not be empty"));
    };
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            "only lowercase letters, digits, '-' and '.' are allowed",
        ));
    }
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err(invalid("must start and end with a letter or digit"));
    }
    Ok(())
}
