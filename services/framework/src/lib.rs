//! ArangoDB Marathon framework.
//!
//! Deploys an ArangoDB cluster (agency, dbservers, coordinators) as one
//! Marathon group and tells the cluster its intended size once coordinators
//! are up.
//!
//! ## Architecture
//!
//! - **Deployment reconciler**: creates the group when Marathon does not have it
//! - **Task discovery**: finds live task endpoints of an app, with bounded retry
//! - **Init supervisor**: sends the one-shot sizing handshake to a coordinator
//! - **Control-plane API**: liveness, and shutdown that tears the group down
//!
//! The reconciler and supervisor each run on their own
//! [`amf_reconcile::Ticker`] and stop on the shared shutdown signal.

pub mod api;
pub mod config;
pub mod deployment;
pub mod discovery;
pub mod error;
pub mod marathon;
pub mod state;
pub mod supervisor;

pub use deployment::{Converged, DeploymentReconciler};
pub use discovery::TaskDiscovery;
pub use error::{FrameworkError, FrameworkResult};
pub use marathon::{DiscoveredTask, MarathonClient};
pub use supervisor::{CoordinatorAdmin, InitState, InitSupervisor, SizingRequest};
