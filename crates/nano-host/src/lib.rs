//! Collaborator contracts for nano plugins.
//!
//! The chat transport, per-guild store, plugin host, translation service,
//! and metrics sink are owned by the bot host. Plugins consume them through
//! the traits defined here; the host provides the production
//! implementations, tests provide in-memory ones.

mod capabilities;
mod error;
mod model;

pub use capabilities::{
    ChatTransport, GuildStore, MESSAGE_COUNTER, MetricsSink, PluginHost, Translations,
};
pub use error::HostError;
pub use model::{
    Channel, ChannelId, Embed, EmbedField, Guild, GuildId, IncomingMessage, Member, Outgoing, User,
    UserId,
};
