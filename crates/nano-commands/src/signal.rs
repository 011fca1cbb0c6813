//! Typed shutdown signal.

use serde::{Deserialize, Serialize};

/// How the process should go down.
///
/// Written at most once per process lifetime by a command handler and read
/// once by the shutdown coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownSignal {
    /// Flush state, then spawn a replacement process before exiting.
    Restart,
    /// Flush state and exit.
    Exit,
}
