use super::types::DEFAULT_SLEEP_MS;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: availability_monitor [--cluster <name>] [--run <N>] [--sleep <ms>] \
[--config <path>] [--registry <url>]
       availability_monitor --serve-registry <addr:port>";

pub const DEFAULT_CONFIG_PATH: &str = "appProperties.json";

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    /// Number of cycles to run, unbounded when absent.
    pub runs: Option<u64>,
    /// Delay between cycles.
    pub sleep_ms: u64,
    pub cluster: Option<String>,
    pub config_path: PathBuf,
    /// Coordination server to register with. In-process registry when absent.
    pub registry_url: Option<String>,
    /// Run the coordination server on this address instead of the monitor.
    pub serve_registry: Option<SocketAddr>,
    pub help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            runs: None,
            sleep_ms: DEFAULT_SLEEP_MS,
            cluster: None,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            registry_url: None,
            serve_registry: None,
            help: false,
        }
    }
}

impl CliArgs {
    /// Parses `std::env::args()`-style input; the first element is the program name.
    ///
    /// Unknown flags are ignored.
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut parsed = CliArgs::default();

        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = || {
                args.get(i + 1)
                    .map(String::as_str)
                    .ok_or_else(|| anyhow::anyhow!("{} requires a value", flag))
            };

            match flag {
                "-r" | "--run" => {
                    parsed.runs = Some(
                        value()?
                            .parse()
                            .context("--run expects a number of cycles")?,
                    );
                    i += 2;
                }
                "-s" | "--sleep" => {
                    parsed.sleep_ms = value()?
                        .parse()
                        .context("--sleep expects milliseconds")?;
                    i += 2;
                }
                "-c" | "--cluster" => {
                    parsed.cluster = Some(value()?.to_string());
                    i += 2;
                }
                "--config" => {
                    parsed.config_path = PathBuf::from(value()?);
                    i += 2;
                }
                "--registry" => {
                    parsed.registry_url = Some(value()?.to_string());
                    i += 2;
                }
                "--serve-registry" => {
                    parsed.serve_registry = Some(
                        value()?
                            .parse()
                            .context("--serve-registry expects addr:port")?,
                    );
                    i += 2;
                }
                "-h" | "--help" => {
                    parsed.help = true;
                    i += 1;
                }
                other => {
                    tracing::debug!("Ignoring unknown argument {}", other);
                    i += 1;
                }
            }
        }

        Ok(parsed)
    }
}
