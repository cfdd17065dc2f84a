//! Configuration Module
//!
//! Everything the monitor needs to know before its first cycle, resolved once at startup.
//!
//! - **`types`**: `AppConfig`, read from an `appProperties.json`-style file. Non-positive
//!   intervals and timeouts fall back to their defaults.
//! - **`args`**: Command line flags.
//! - **`context`**: `MonitorContext`, the merged view shared by every component.

pub mod args;
pub mod context;
pub mod types;
