//! Liveness log line emitted on a fixed interval while a cycle is running.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct Heartbeat {
    cluster: String,
    interval: Duration,
    beats: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Heartbeat {
    /// Spawns the heartbeat task. The first beat fires immediately.
    pub fn start(cluster: impl Into<String>, interval: Duration) -> Self {
        let cluster = cluster.into();
        let interval = interval.max(Duration::from_millis(1));
        let beats = Arc::new(AtomicU64::new(0));

        let task_cluster = cluster.clone();
        let task_beats = beats.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;
                let beat = task_beats.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::info!("Heartbeat #{} for cluster {}", beat, task_cluster);
            }
        });

        Self {
            cluster,
            interval,
            beats,
            handle: Some(handle),
        }
    }

    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the task; later calls do nothing.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(
                "Heartbeat for {} stopped after {} beat(s)",
                self.cluster,
                self.beats()
            );
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.stop();
    }
}
