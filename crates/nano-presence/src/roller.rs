//! Status roller implementation.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use nano_host::ChatTransport;

/// Default sleep between status changes: six hours.
pub const DEFAULT_INTERVAL_SECS: u64 = 21_600;

/// Statuses used when the configured list is empty. The rotation never
/// runs on an empty list.
const FALLBACK_STATUSES: &[&str] = &[
    "keeping the lights on",
    "rotating backups",
    "watching the event loop",
    "nano.help",
];

/// Drives periodic presence updates through the transport.
///
/// Owns its status list; there is no shared module-level state. The list
/// is shuffled in place at the start of each pass.
pub struct StatusRoller {
    transport: Arc<dyn ChatTransport>,
    statuses: Vec<String>,
    interval: Duration,
    rng: StdRng,
}

impl StatusRoller {
    /// Create a roller with an entropy-seeded shuffle.
    pub fn new(transport: Arc<dyn ChatTransport>, statuses: Vec<String>) -> Self {
        Self::with_rng(transport, statuses, StdRng::from_entropy())
    }

    /// Create a roller with a caller-provided RNG. Tests seed this for a
    /// deterministic shuffle order.
    pub fn with_rng(transport: Arc<dyn ChatTransport>, statuses: Vec<String>, rng: StdRng) -> Self {
        let statuses = if statuses.is_empty() {
            FALLBACK_STATUSES.iter().map(|s| s.to_string()).collect()
        } else {
            statuses
        };

        Self {
            transport,
            statuses,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            rng,
        }
    }

    /// Override the sleep between status changes.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// The current status list.
    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    /// Update every active shard to `status`, suffixed with a 1-indexed
    /// shard label. All shards see the new value before the caller sleeps;
    /// a failing shard is logged and skipped.
    async fn broadcast_status(&self, status: &str) {
        debug!(status = %status, "changing status");

        for shard in self.transport.shard_ids() {
            let label = format!("{status} | shard {}", shard + 1);
            if let Err(e) = self.transport.change_shard_presence(shard, &label).await {
                warn!(shard, error = %e, "presence update failed");
            }
        }
    }

    /// Run the rotation until shutdown or until the transport reports the
    /// connection closed. Suspension happens only at the sleep point.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(count = self.statuses.len(), "status roller starting");

        'rotation: loop {
            // Shuffle in place, then replay the whole list once.
            self.statuses.shuffle(&mut self.rng);
            let pass = self.statuses.clone();

            for status in &pass {
                self.broadcast_status(status).await;

                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("status roller received shutdown signal");
                            break 'rotation;
                        }
                    }

                    _ = sleep(self.interval) => {}
                }

                if self.transport.is_closed() {
                    info!("transport closed, exiting status roller");
                    break 'rotation;
                }
            }
        }

        info!("status roller stopped");
    }
}
