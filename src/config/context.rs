//! Startup context shared by the orchestrator and its collaborators.

use super::args::CliArgs;
use super::types::AppConfig;
use crate::membership::coordination::join_path;
use crate::membership::types::PeerAddress;

use anyhow::Result;
use rand::Rng;
use std::net::UdpSocket;
use std::time::Duration;

/// Identity and settings of this monitor process, built once in `main`.
#[derive(Debug, Clone)]
pub struct MonitorContext {
    pub cluster: String,
    pub computer_name: String,
    /// Address advertised to peers.
    pub self_address: PeerAddress,
    pub config: AppConfig,
    pub sleep: Duration,
    pub runs: Option<u64>,
}

impl MonitorContext {
    pub fn resolve(args: &CliArgs, config: AppConfig) -> Result<Self> {
        let cluster = resolve_cluster(&config, args)?;

        Ok(Self {
            cluster,
            computer_name: computer_name(),
            self_address: PeerAddress::new(local_ip(), random_port()),
            config,
            sleep: Duration::from_millis(args.sleep_ms),
            runs: args.runs,
        })
    }

    /// Coordination path under which every instance watching this cluster registers.
    pub fn registration_path(&self) -> String {
        join_path(&self.config.registration_root, &self.cluster)
    }
}

/// The properties file wins over the command line; one of them must name the cluster.
pub fn resolve_cluster(config: &AppConfig, args: &CliArgs) -> Result<String> {
    let from_config = config
        .environment_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let from_args = args
        .cluster
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    from_config.or(from_args).map(str::to_string).ok_or_else(|| {
        anyhow::anyhow!(
            "cluster name must be provided either on the command line or in the app properties"
        )
    })
}

/// Best-effort address of the interface used for outbound traffic.
pub fn local_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            // No packet is sent; connecting only selects the outbound interface.
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|e| {
            tracing::warn!("Could not determine local address: {}", e);
            "127.0.0.1".to_string()
        })
}

pub fn computer_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Advertised port. Picked at random; collisions between instances on one host are not handled.
fn random_port() -> u16 {
    rand::thread_rng().gen_range(1024..=u16::MAX)
}
