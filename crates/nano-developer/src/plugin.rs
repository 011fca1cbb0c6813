//! Plugin facade: host event hooks over the maintenance components.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use nano_backup::{BackupConfig, BackupError, BackupManager};
use nano_commands::{CommandError, CommandRouter, RouterConfig, ShutdownSignal};
use nano_host::{
    ChatTransport, GuildStore, IncomingMessage, MetricsSink, PluginHost, Translations, UserId,
};
use nano_presence::StatusRoller;

use crate::shutdown::{ProcessSpawner, ShutdownCoordinator, ShutdownError};

/// Plugin name reported to the host.
pub const PLUGIN_NAME: &str = "Developer Commands";

/// Plugin version reported to the host.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors raised while constructing the plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Host-provided collaborators.
pub struct PluginDeps {
    pub transport: Arc<dyn ChatTransport>,
    pub store: Arc<dyn GuildStore>,
    pub plugins: Arc<dyn PluginHost>,
    pub translations: Arc<dyn Translations>,
    pub metrics: Arc<dyn MetricsSink>,
    pub spawner: Box<dyn ProcessSpawner>,
}

/// Plugin configuration.
pub struct PluginConfig {
    /// The single identity permitted to invoke the commands here.
    pub owner: UserId,
    /// Backup paths and cadence.
    pub backup: BackupConfig,
    /// Status strings to rotate; an empty list uses the canonical
    /// fallback set.
    pub statuses: Vec<String>,
    /// Override for the status-rotation interval.
    pub status_interval: Option<Duration>,
}

/// The developer/maintenance plugin.
///
/// Owns the backup manager, the status roller, and the command router,
/// and exposes the event hooks the host drives.
pub struct DeveloperPlugin {
    backup: Arc<BackupManager>,
    router: Arc<CommandRouter>,
    coordinator: ShutdownCoordinator,
    /// Taken by `on_ready` when the rotation task starts.
    roller: Mutex<Option<StatusRoller>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DeveloperPlugin {
    /// Build the plugin. Fails on invalid backup configuration or a
    /// malformed dispatch table.
    pub fn new(config: PluginConfig, deps: PluginDeps) -> Result<Self, PluginError> {
        let backup = Arc::new(BackupManager::new(config.backup)?);

        let mut roller = StatusRoller::new(Arc::clone(&deps.transport), config.statuses);
        if let Some(interval) = config.status_interval {
            roller = roller.with_interval(interval);
        }

        let router = Arc::new(CommandRouter::new(
            RouterConfig {
                owner: config.owner,
            },
            Arc::clone(&deps.transport),
            Arc::clone(&deps.store),
            deps.plugins,
            deps.translations,
            deps.metrics,
            Arc::clone(&backup),
        )?);

        let coordinator = ShutdownCoordinator::new(deps.store, deps.spawner);

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            backup,
            router,
            coordinator,
            roller: Mutex::new(Some(roller)),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// The backup manager, for hosts that expose a disable switch.
    pub fn backup(&self) -> &Arc<BackupManager> {
        &self.backup
    }

    /// The recorded shutdown signal, if a handler set one.
    pub fn shutdown_signal(&self) -> Option<ShutdownSignal> {
        self.router.shutdown_signal()
    }

    /// Start the backup and status loops as independent tasks.
    pub fn on_ready(&self) {
        let Some(roller) = self
            .roller
            .lock()
            .expect("roller lock poisoned")
            .take()
        else {
            warn!("maintenance loops already started");
            return;
        };

        let mut tasks = self.tasks.lock().expect("task list lock poisoned");

        let backup = Arc::clone(&self.backup);
        let backup_rx = self.shutdown_tx.subscribe();
        tasks.push(tokio::spawn(async move { backup.run(backup_rx).await }));

        let roller_rx = self.shutdown_tx.subscribe();
        tasks.push(tokio::spawn(roller.run(roller_rx)));

        info!("maintenance loops started");
    }

    /// Route one inbound message. Returns the shutdown signal for the
    /// restart/exit commands; the host must then stop delivering events.
    pub async fn on_message(
        &self,
        message: &IncomingMessage,
        prefix: &str,
        locale: &str,
    ) -> Result<Option<ShutdownSignal>, CommandError> {
        self.router.handle(message, prefix, locale).await
    }

    /// Stop the loops, flush persistent state, and perform the restart
    /// handoff when one was requested.
    pub async fn on_shutdown(&self) -> Result<(), ShutdownError> {
        let _ = self.shutdown_tx.send(true);

        let tasks: Vec<JoinHandle<()>> =
            std::mem::take(&mut *self.tasks.lock().expect("task list lock poisoned"));
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "maintenance task ended abnormally");
            }
        }

        self.coordinator.run(self.router.shutdown_signal()).await
    }
}
