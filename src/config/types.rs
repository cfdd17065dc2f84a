use crate::membership::service::DEFAULT_REGISTRATION_ROOT;
use crate::workers::types::WorkerKind;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SLEEP_MS: u64 = 30_000;
pub const DEFAULT_CYCLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_PRODUCER_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_AVAILABILITY_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_LEADER_INFO_INTERVAL_MS: u64 = 300_000;
pub const DEFAULT_CONSUMER_INTERVAL_MS: u64 = 300_000;
pub const DEFAULT_WARMUP_MS: u64 = 5_000;
pub const DEFAULT_POOL_SHUTDOWN_GRACE_MS: u64 = 10_000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30;
pub const DEFAULT_BROKER_CONNECT_TIMEOUT_MS: u64 = 3_000;

/// Per-kind job deadlines in seconds. Unset or non-positive means "use the cycle timeout".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobTimeouts {
    pub leader_info: Option<i64>,
    pub producer: Option<i64>,
    pub availability: Option<i64>,
    pub consumer: Option<i64>,
}

impl JobTimeouts {
    fn get(&self, kind: WorkerKind) -> Option<i64> {
        match kind {
            WorkerKind::LeaderInfo => self.leader_info,
            WorkerKind::Producer => self.producer,
            WorkerKind::Availability => self.availability,
            WorkerKind::Consumer => self.consumer,
        }
    }
}

/// Application properties.
///
/// Field names on the wire follow the properties file the monitor has always read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(rename = "environmentName")]
    pub environment_name: Option<String>,

    #[serde(rename = "heartBeatIntervalInSeconds")]
    pub heartbeat_interval_secs: i64,

    #[serde(rename = "producerThreadSleepTime")]
    pub producer_interval_ms: i64,

    #[serde(rename = "availabilityThreadSleepTime")]
    pub availability_interval_ms: i64,

    #[serde(rename = "leaderInfoThreadSleepTime")]
    pub leader_info_interval_ms: i64,

    #[serde(rename = "consumerThreadSleepTime")]
    pub consumer_interval_ms: i64,

    #[serde(rename = "mainThreadsTimeoutInSeconds")]
    pub cycle_timeout_secs: i64,

    #[serde(rename = "jobTimeoutsInSeconds")]
    pub job_timeouts: JobTimeouts,

    /// Pause before each peer sync so dependent clients can finish starting.
    #[serde(rename = "warmupMs")]
    pub warmup_ms: i64,

    /// How long teardown waits for running jobs before aborting them.
    #[serde(rename = "poolShutdownGraceMs")]
    pub pool_shutdown_grace_ms: i64,

    #[serde(rename = "registryUrl")]
    pub registry_url: Option<String>,

    #[serde(rename = "registrationRoot")]
    pub registration_root: String,

    #[serde(rename = "sessionTtlSeconds")]
    pub session_ttl_secs: i64,

    pub brokers: Vec<String>,

    #[serde(rename = "brokerConnectTimeoutMs")]
    pub broker_connect_timeout_ms: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment_name: None,
            heartbeat_interval_secs: 0,
            producer_interval_ms: 0,
            availability_interval_ms: 0,
            leader_info_interval_ms: 0,
            consumer_interval_ms: 0,
            cycle_timeout_secs: 0,
            job_timeouts: JobTimeouts::default(),
            warmup_ms: DEFAULT_WARMUP_MS as i64,
            pool_shutdown_grace_ms: DEFAULT_POOL_SHUTDOWN_GRACE_MS as i64,
            registry_url: None,
            registration_root: DEFAULT_REGISTRATION_ROOT.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS as i64,
            brokers: Vec::new(),
            broker_connect_timeout_ms: DEFAULT_BROKER_CONNECT_TIMEOUT_MS as i64,
        }
    }
}

fn positive_or(value: i64, default: u64) -> u64 {
    if value > 0 { value as u64 } else { default }
}

/// Zero is a meaningful setting for pauses, so only negative values fall back.
fn non_negative_or(value: i64, default: u64) -> u64 {
    if value >= 0 { value as u64 } else { default }
}

impl AppConfig {
    /// Reads the properties file, or returns defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No properties file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        tracing::info!("Loaded properties from {}", path.display());
        Ok(config)
    }

    pub fn interval_for(&self, kind: WorkerKind) -> Duration {
        let ms = match kind {
            WorkerKind::Producer => {
                positive_or(self.producer_interval_ms, DEFAULT_PRODUCER_INTERVAL_MS)
            }
            WorkerKind::Availability => positive_or(
                self.availability_interval_ms,
                DEFAULT_AVAILABILITY_INTERVAL_MS,
            ),
            WorkerKind::LeaderInfo => {
                positive_or(self.leader_info_interval_ms, DEFAULT_LEADER_INFO_INTERVAL_MS)
            }
            WorkerKind::Consumer => {
                positive_or(self.consumer_interval_ms, DEFAULT_CONSUMER_INTERVAL_MS)
            }
        };
        Duration::from_millis(ms)
    }

    /// Upper bound on one cycle's drain.
    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(positive_or(
            self.cycle_timeout_secs,
            DEFAULT_CYCLE_TIMEOUT_SECS,
        ))
    }

    pub fn job_timeout(&self, kind: WorkerKind) -> Duration {
        match self.job_timeouts.get(kind) {
            Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
            _ => self.cycle_timeout(),
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(positive_or(
            self.heartbeat_interval_secs,
            DEFAULT_HEARTBEAT_INTERVAL_SECS,
        ))
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(non_negative_or(self.warmup_ms, DEFAULT_WARMUP_MS))
    }

    pub fn pool_shutdown_grace(&self) -> Duration {
        Duration::from_millis(non_negative_or(
            self.pool_shutdown_grace_ms,
            DEFAULT_POOL_SHUTDOWN_GRACE_MS,
        ))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(positive_or(self.session_ttl_secs, DEFAULT_SESSION_TTL_SECS))
    }

    pub fn broker_connect_timeout(&self) -> Duration {
        Duration::from_millis(positive_or(
            self.broker_connect_timeout_ms,
            DEFAULT_BROKER_CONNECT_TIMEOUT_MS,
        ))
    }
}
