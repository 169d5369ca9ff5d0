//! Cluster sizing model and orchestrator descriptors.
//!
//! This crate turns a [`ClusterSpec`] into the documents the orchestrator
//! understands:
//!
//! - **Role descriptors**: one [`AppDescriptor`] per role (agency, dbserver,
//!   coordinator), derived from the role's resource limits.
//! - **Group descriptor**: a [`GroupDescriptor`] that nests the three apps and
//!   declares that the servers depend on the agency.
//!
//! # Invariants
//!
//! - Builders are pure: no I/O, no clocks, no randomness
//! - Identical input produces byte-identical JSON (all maps are ordered)

mod app;
mod group;
mod spec;

pub use app::{
    build_app, AppDescriptor, Constraint, Container, Docker, HealthCheck, PersistentVolume,
    PortMapping, Residency, Volume, ARANGODB_PORT,
};
pub use group::GroupDescriptor;
pub use spec::{ClusterSpec, Role, RoleLimits, RoleSet, SpecError, DEFAULT_IMAGE};
