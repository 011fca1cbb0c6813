//! Developer/maintenance plugin for the nano bot.
//!
//! Wires the backup manager, status roller, and command router into the
//! host's event hooks:
//! - `on_ready` starts the backup and status loops as independent tasks
//! - `on_message` routes owner-restricted commands
//! - `on_shutdown` stops the loops, flushes persistent state, and spawns
//!   a replacement process when a restart was requested

mod plugin;
mod shutdown;

pub use plugin::{DeveloperPlugin, PLUGIN_NAME, PLUGIN_VERSION, PluginConfig, PluginDeps, PluginError};
pub use shutdown::{ProcessSpawner, ScriptSpawner, ShutdownCoordinator, ShutdownError};
