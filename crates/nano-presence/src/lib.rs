//! Rotating presence status for the nano bot.
//!
//! A single long-lived task shuffles a list of status strings and walks it,
//! updating every shard's presence before each sleep. The list is
//! reshuffled after each full pass.

mod roller;

pub use roller::{DEFAULT_INTERVAL_SECS, StatusRoller};
