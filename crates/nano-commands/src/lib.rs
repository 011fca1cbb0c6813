//! Owner-restricted command routing for the nano bot.
//!
//! Inbound messages are validated against the top-level command table,
//! gated on the configured owner, and dispatched through an ordered table
//! of literal command tokens. Two commands request shutdown; the router
//! records the typed signal for the shutdown coordinator to consume.

mod dispatch;
mod error;
mod humanize;
mod router;
mod signal;
mod table;

pub use dispatch::{CommandKind, DispatchEntry, DispatchTable};
pub use error::CommandError;
pub use humanize::humanize_age;
pub use router::{CommandRouter, RouterConfig};
pub use signal::ShutdownSignal;
pub use table::{CommandSpec, CommandTable};
