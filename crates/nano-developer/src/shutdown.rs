//! Shutdown coordination: flush, then (maybe) respawn.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use nano_commands::ShutdownSignal;
use nano_host::GuildStore;

/// Default start script launched on restart.
#[cfg(windows)]
const START_SCRIPT: &str = "startbot.bat";
#[cfg(not(windows))]
const START_SCRIPT: &str = "startbot.sh";

/// Errors raised while handing the process off.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The replacement process could not be spawned.
    #[error("failed to spawn replacement process: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Spawns the replacement bot process on restart.
pub trait ProcessSpawner: Send + Sync {
    fn spawn_replacement(&self) -> Result<(), ShutdownError>;
}

/// Launches the platform start script as a detached child.
pub struct ScriptSpawner {
    script: PathBuf,
}

impl ScriptSpawner {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// The platform default (`startbot.sh` / `startbot.bat`) resolved
    /// against the current working directory.
    pub fn platform_default() -> Self {
        Self::new(START_SCRIPT)
    }
}

impl ProcessSpawner for ScriptSpawner {
    fn spawn_replacement(&self) -> Result<(), ShutdownError> {
        // The child is intentionally not waited on; it outlives us.
        std::process::Command::new(&self.script).spawn()?;
        Ok(())
    }
}

/// Consumes the recorded shutdown signal: requests a durable save, then
/// spawns a replacement process for `Restart`.
///
/// The flush is always requested before any respawn, so a restart race
/// cannot lose data.
pub struct ShutdownCoordinator {
    store: Arc<dyn GuildStore>,
    spawner: Box<dyn ProcessSpawner>,
}

impl ShutdownCoordinator {
    pub fn new(store: Arc<dyn GuildStore>, spawner: Box<dyn ProcessSpawner>) -> Self {
        Self { store, spawner }
    }

    /// Run the handoff. The save is requested unconditionally; a failed
    /// flush is logged and does not block the respawn.
    pub async fn run(&self, signal: Option<ShutdownSignal>) -> Result<(), ShutdownError> {
        info!(?signal, "flushing persistent state");
        if let Err(e) = self.store.flush().await {
            error!(error = %e, "durable save request failed");
        }

        if signal == Some(ShutdownSignal::Restart) {
            info!("spawning replacement process");
            self.spawner.spawn_replacement()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use nano_host::{GuildId, HostError};

    /// Shared call log used to observe cross-collaborator ordering.
    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    struct LoggingStore {
        log: CallLog,
    }

    #[async_trait]
    impl GuildStore for LoggingStore {
        async fn guild_data(
            &self,
            _guild: GuildId,
        ) -> Result<Option<serde_json::Value>, HostError> {
            Ok(None)
        }

        async fn retain_guilds(&self, _live: &[GuildId]) -> Result<usize, HostError> {
            Ok(0)
        }

        async fn flush(&self) -> Result<(), HostError> {
            self.log.lock().unwrap().push("flush");
            Ok(())
        }
    }

    struct LoggingSpawner {
        log: CallLog,
    }

    impl ProcessSpawner for LoggingSpawner {
        fn spawn_replacement(&self) -> Result<(), ShutdownError> {
            self.log.lock().unwrap().push("spawn");
            Ok(())
        }
    }

    fn coordinator() -> (ShutdownCoordinator, CallLog) {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let coordinator = ShutdownCoordinator::new(
            Arc::new(LoggingStore { log: Arc::clone(&log) }),
            Box::new(LoggingSpawner { log: Arc::clone(&log) }),
        );
        (coordinator, log)
    }

    #[tokio::test]
    async fn restart_flushes_before_respawning() {
        let (coordinator, log) = coordinator();

        coordinator.run(Some(ShutdownSignal::Restart)).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["flush", "spawn"]);
    }

    #[tokio::test]
    async fn exit_flushes_without_respawning() {
        let (coordinator, log) = coordinator();

        coordinator.run(Some(ShutdownSignal::Exit)).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["flush"]);
    }

    #[tokio::test]
    async fn host_driven_shutdown_still_flushes() {
        let (coordinator, log) = coordinator();

        coordinator.run(None).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["flush"]);
    }
}
