//! Error type for collaborator operations.

use thiserror::Error;

use crate::model::{ChannelId, GuildId, UserId};

/// Errors surfaced by the host-provided collaborators.
#[derive(Debug, Error)]
pub enum HostError {
    /// The transport does not know the guild.
    #[error("unknown guild: {0}")]
    UnknownGuild(GuildId),

    /// The transport does not know the user.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// The guild has no resolvable default channel.
    #[error("no default channel for guild {0}")]
    NoDefaultChannel(GuildId),

    /// A message could not be delivered.
    #[error("delivery to channel {channel} failed: {reason}")]
    Delivery { channel: ChannelId, reason: String },

    /// The transport connection is closed or the operation failed in flight.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The per-guild store rejected an operation.
    #[error("store failure: {0}")]
    Store(String),

    /// The plugin host rejected an operation.
    #[error("plugin host failure: {0}")]
    PluginHost(String),
}
