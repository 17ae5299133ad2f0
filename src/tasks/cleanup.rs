//! Cleanup Sweep Task
//!
//! Background task that periodically removes expired entries and fires one
//! remove event per deletion. Runs only in long-lived host contexts; the
//! store never starts it where the host may suspend the context between
//! events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::Shared;

// == Cleanup Task ==
/// Handle to a running cleanup sweep loop.
pub(crate) struct CleanupTask {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Spawns the sweep loop on the current tokio runtime.
    pub(crate) fn spawn(shared: Arc<Shared>, interval: Duration) -> Self {
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(run_sweep_loop(shared, interval, Arc::clone(&shutdown)));
        Self { shutdown, handle }
    }

    /// Signals the loop to stop. An in-flight sweep finishes its current
    /// backend call; only future ticks are disabled.
    pub(crate) fn stop(self) {
        self.shutdown.notify_one();
    }

    /// Whether the loop has fully exited.
    #[allow(dead_code)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// The sweep loop: tick, scan, delete expired, repeat.
///
/// Tick errors are logged and the next tick retries; the scheduler never
/// crashes. A tick that finds the host context invalid skips without
/// touching the backend.
async fn run_sweep_loop(shared: Arc<Shared>, interval: Duration, shutdown: Arc<Notify>) {
    info!(interval_ms = interval.as_millis() as u64, "Cleanup scheduler started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.notified() => {
                info!("Cleanup scheduler stopped");
                break;
            }
        }

        if !shared.context.is_valid() {
            debug!("Host context invalid, skipping sweep");
            continue;
        }

        match shared.sweep_expired().await {
            Ok(0) => debug!("Sweep found no expired entries"),
            Ok(removed) => info!(removed, "Sweep removed expired entries"),
            Err(e) => warn!(error = %e, "Sweep failed, retrying at next interval"),
        }
    }
}
