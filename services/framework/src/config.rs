//! Command-line and environment configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use amf_descriptor::{ClusterSpec, RoleLimits, RoleSet};
use amf_reconcile::{
    RetryPolicy, DEFAULT_DISCOVERY_ATTEMPTS, DEFAULT_DISCOVERY_DELAY, DEFAULT_TICK_INTERVAL,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// Deploy an ArangoDB cluster on Marathon and keep it initialized.
#[derive(Debug, Clone, Parser)]
#[command(name = "arangodb-framework", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Name of the ArangoDB cluster (orchestrator group id).
    #[arg(long, env = "AMF_CLUSTER_NAME", default_value = "arangodb")]
    pub name: String,

    /// Base URL of the Marathon API.
    #[arg(long, env = "AMF_MARATHON_URL", default_value = "http://marathon.mesos:8080")]
    pub marathon: String,

    /// Container image for all roles.
    #[arg(long, env = "AMF_IMAGE", default_value = amf_descriptor::DEFAULT_IMAGE)]
    pub image: String,

    #[arg(long, alias = "agentCPULimit", default_value_t = 1.0)]
    pub agent_cpu_limit: f64,
    #[arg(long, alias = "agentMemLimit", default_value_t = 2048)]
    pub agent_mem_limit: u32,
    #[arg(long, alias = "agentDiskLimit", default_value_t = 2048)]
    pub agent_disk_limit: u32,
    /// Number of agents in the agency.
    #[arg(long, alias = "agentNumber", default_value_t = 3)]
    pub agent_number: u32,

    #[arg(long, alias = "dbserverCPULimit", default_value_t = 1.0)]
    pub dbserver_cpu_limit: f64,
    #[arg(long, alias = "dbserverMemLimit", default_value_t = 2048)]
    pub dbserver_mem_limit: u32,
    #[arg(long, alias = "dbserverDiskLimit", default_value_t = 2048)]
    pub dbserver_disk_limit: u32,
    #[arg(long, alias = "dbserverNumber", default_value_t = 2)]
    pub dbserver_number: u32,

    #[arg(long, alias = "coordinatorCPULimit", default_value_t = 1.0)]
    pub coordinator_cpu_limit: f64,
    #[arg(long, alias = "coordinatorMemLimit", default_value_t = 2048)]
    pub coordinator_mem_limit: u32,
    #[arg(long, alias = "coordinatorDiskLimit", default_value_t = 2048)]
    pub coordinator_disk_limit: u32,
    #[arg(long, alias = "coordinatorNumber", default_value_t = 2)]
    pub coordinator_number: u32,

    /// Address the control-plane API binds to.
    #[arg(long, env = "AMF_LISTEN_HOST", default_value = "0.0.0.0")]
    pub listen_host: IpAddr,

    /// Port the control-plane API binds to.
    #[arg(long, env = "PORT0", default_value_t = 8000)]
    pub port: u16,

    #[arg(long, default_value_t = DEFAULT_TICK_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    pub reconcile_interval_secs: u64,

    #[arg(long, default_value_t = DEFAULT_TICK_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    pub supervise_interval_secs: u64,

    /// Attempts per coordinator discovery before giving up for this tick.
    #[arg(long, default_value_t = DEFAULT_DISCOVERY_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    pub discovery_attempts: u32,

    #[arg(long, default_value_t = DEFAULT_DISCOVERY_DELAY.as_millis() as u64)]
    pub discovery_delay_ms: u64,

    /// Timeout for every orchestrator and coordinator request.
    #[arg(long, env = "AMF_HTTP_TIMEOUT_SECS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub http_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, env = "AMF_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the group descriptor that would be submitted, then exit.
    Render,
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub cluster: ClusterSpec,
    pub listen_addr: SocketAddr,
    pub reconcile_interval: Duration,
    pub supervise_interval: Duration,
    pub discovery: RetryPolicy,
    pub http_timeout: Duration,
    pub log_level: String,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let roles = RoleSet {
            agency: RoleLimits::new(
                cli.agent_cpu_limit,
                cli.agent_mem_limit,
                cli.agent_disk_limit,
                cli.agent_number,
            ),
            dbserver: RoleLimits::new(
                cli.dbserver_cpu_limit,
                cli.dbserver_mem_limit,
                cli.dbserver_disk_limit,
                cli.dbserver_number,
            ),
            coordinator: RoleLimits::new(
                cli.coordinator_cpu_limit,
                cli.coordinator_mem_limit,
                cli.coordinator_disk_limit,
                cli.coordinator_number,
            ),
        };

        let cluster = ClusterSpec::new(cli.name.as_str(), cli.marathon.as_str(), roles)
            .context("invalid cluster configuration")?
            .with_image(cli.image.as_str());

        Ok(Self {
            cluster,
            listen_addr: SocketAddr::new(cli.listen_host, cli.port),
            reconcile_interval: Duration::from_secs(cli.reconcile_interval_secs),
            supervise_interval: Duration::from_secs(cli.supervise_interval_secs),
            discovery: RetryPolicy::fixed(
                cli.discovery_attempts,
                Duration::from_millis(cli.discovery_delay_ms),
            ),
            http_timeout: Duration::from_secs(cli.http_timeout_secs),
            log_level: cli.log_level.clone(),
        })
    }
}
