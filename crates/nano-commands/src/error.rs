//! Error types for command routing.

use thiserror::Error;

/// Errors surfaced by the command router.
///
/// User-input and collaborator failures are reported to the invoking
/// channel instead of being returned; the variants here are the
/// construction-time table violation and the one deliberately unhandled
/// diagnostic fault.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A dispatch-table token would intercept a longer token listed after
    /// it. The table must list the longer token first.
    #[error("dispatch table: '{shorter}' shadows '{longer}'; list the longer token first")]
    ShadowedCommand { shorter: String, longer: String },

    /// Two dispatch-table entries share a token.
    #[error("dispatch table: duplicate token '{0}'")]
    DuplicateCommand(String),

    /// The deliberate type-conversion failure behind the fault-injection
    /// command. Must propagate to the host unmodified.
    #[error("injected diagnostic fault: {0}")]
    InjectedFault(#[from] std::num::ParseIntError),
}
