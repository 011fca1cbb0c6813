//! Backup manager implementation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::fs;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::BackupError;

/// Default interval between scheduled cycles: one day.
const DEFAULT_INTERVAL_SECS: u64 = 86_400;

/// Default number of cycles between dated snapshots.
const DEFAULT_KEEP_EVERY: u32 = 3;

/// File name of the data file being backed up.
const DATA_FILE: &str = "data.rdb";

/// File name of the rotating backup slot.
const ROTATING_FILE: &str = "data.rdb.bak";

/// Subdirectory of the backup directory holding dated snapshots.
const DATED_SUBDIR: &str = "full";

/// Timestamp format for dated snapshot names, second granularity.
/// Collisions within the same second overwrite.
const DATED_STAMP_FORMAT: &str = "%d-%B-%Y_%H-%M-%S";

/// Configuration for the backup manager.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Directory holding the live data file.
    pub data_dir: PathBuf,
    /// Directory receiving the rotating backup and dated snapshots.
    pub backup_dir: PathBuf,
    /// Sleep between scheduled cycles.
    pub interval: Duration,
    /// A dated snapshot is taken every this many scheduled cycles.
    pub keep_every: u32,
}

impl BackupConfig {
    /// Configuration with the default daily interval and retention.
    pub fn new(data_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_dir: backup_dir.into(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            keep_every: DEFAULT_KEEP_EVERY,
        }
    }

    /// Override the cycle interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the dated-snapshot cadence.
    pub fn with_keep_every(mut self, keep_every: u32) -> Self {
        self.keep_every = keep_every;
        self
    }
}

/// What a single backup cycle wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Path of the dated snapshot, if one was written this cycle.
    pub dated: Option<PathBuf>,
    /// Whether the rotating slot was overwritten.
    pub rotated: bool,
}

impl CycleOutcome {
    fn skipped() -> Self {
        Self {
            dated: None,
            rotated: false,
        }
    }
}

/// Owns backup scheduling state and the copy operations against the data
/// and backup directories.
///
/// The retention counter is mutated only by scheduled cycles; manual
/// backups never consult or touch it. All destination writes are
/// idempotent overwrites, so a manual backup racing the scheduled loop is
/// last-writer-wins without locking around the copies.
pub struct BackupManager {
    source: PathBuf,
    rotating: PathBuf,
    dated_dir: PathBuf,
    backup_dir: PathBuf,
    interval: Duration,
    keep_every: u32,
    /// Always in `[1, keep_every]` between cycles.
    cycles_until_dated: Mutex<u32>,
    enabled: AtomicBool,
}

impl BackupManager {
    /// Create a manager from configuration.
    pub fn new(config: BackupConfig) -> Result<Self, BackupError> {
        if config.keep_every == 0 {
            return Err(BackupError::InvalidKeepEvery);
        }

        Ok(Self {
            source: config.data_dir.join(DATA_FILE),
            rotating: config.backup_dir.join(ROTATING_FILE),
            dated_dir: config.backup_dir.join(DATED_SUBDIR),
            backup_dir: config.backup_dir,
            interval: config.interval,
            keep_every: config.keep_every,
            cycles_until_dated: Mutex::new(config.keep_every),
            enabled: AtomicBool::new(true),
        })
    }

    /// Whether scheduled cycles are still running.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Permanently stop future scheduled cycles. Idempotent; existing
    /// backups are untouched and manual backups keep working.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Current value of the retention counter.
    pub fn cycles_until_dated(&self) -> u32 {
        *self
            .cycles_until_dated
            .lock()
            .expect("rotation counter lock poisoned")
    }

    /// Advance the retention counter by one cycle and report whether this
    /// cycle must take a dated snapshot. Resets to `keep_every` when the
    /// counter runs out.
    fn advance_rotation(&self) -> bool {
        let mut counter = self
            .cycles_until_dated
            .lock()
            .expect("rotation counter lock poisoned");
        *counter = counter.saturating_sub(1);
        if *counter == 0 {
            *counter = self.keep_every;
            true
        } else {
            false
        }
    }

    /// Run one scheduled cycle: advance the retention counter, then back
    /// up. A no-op once the manager is disabled.
    pub async fn run_scheduled_cycle(&self) -> Result<CycleOutcome, BackupError> {
        if !self.is_enabled() {
            return Ok(CycleOutcome::skipped());
        }

        let dated = self.advance_rotation();
        self.backup(dated).await
    }

    /// Force a dated backup now, outside the schedule. Does not consult
    /// `enabled` and does not mutate the retention counter.
    pub async fn manual_backup(&self) -> Result<CycleOutcome, BackupError> {
        let outcome = self.backup(true).await?;
        info!("manual backup complete");
        Ok(outcome)
    }

    /// Copy the data file into the backup layout.
    ///
    /// The dated snapshot (if requested) is always written before the
    /// rotating slot. A missing source file skips the copy steps silently.
    async fn backup(&self, dated: bool) -> Result<CycleOutcome, BackupError> {
        create_dir_if_absent(&self.backup_dir).await?;

        let mut outcome = CycleOutcome::skipped();

        if dated {
            create_dir_if_absent(&self.dated_dir).await?;

            let stamp = chrono::Local::now().format(DATED_STAMP_FORMAT);
            let snapshot = self.dated_dir.join(format!("data{stamp}.rdb"));
            if self.copy_if_present(&snapshot).await? {
                info!(path = %snapshot.display(), "created dated backup");
                outcome.dated = Some(snapshot);
            }
        }

        outcome.rotated = self.copy_if_present(&self.rotating).await?;

        Ok(outcome)
    }

    /// Copy the source file to `to`, treating a missing source as
    /// "nothing to back up yet".
    async fn copy_if_present(&self, to: &Path) -> Result<bool, BackupError> {
        match fs::copy(&self.source, to).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(source = %self.source.display(), "data file absent, skipping copy");
                Ok(false)
            }
            Err(e) => Err(BackupError::Copy {
                path: to.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Run the backup loop until shutdown or `disable`.
    ///
    /// Suspension happens only at the sleep point; an in-flight copy is
    /// never interrupted. `disable` is observed at the top of the next
    /// iteration.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            keep_every = self.keep_every,
            "backup loop starting"
        );

        loop {
            if !self.is_enabled() {
                info!("backup disabled, exiting loop");
                break;
            }

            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("backup loop received shutdown signal");
                        break;
                    }
                }

                _ = sleep(self.interval) => {
                    debug!("creating a backup");
                    if let Err(e) = self.run_scheduled_cycle().await {
                        error!(error = %e, "scheduled backup failed");
                    }
                }
            }
        }

        info!("backup loop stopped");
    }
}

/// Create a directory if it does not exist. Racing creators are fine:
/// an already-existing directory is a no-op, not an error.
async fn create_dir_if_absent(path: &Path) -> Result<(), BackupError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| BackupError::CreateDir {
            path: path.to_path_buf(),
            source: e,
        })
}
