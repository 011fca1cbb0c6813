//! Capability traits implemented by the bot host.

use async_trait::async_trait;

use crate::error::HostError;
use crate::model::{Channel, ChannelId, Guild, GuildId, Member, Outgoing, User, UserId};

/// Counter incremented once per recognized command message.
pub const MESSAGE_COUNTER: &str = "messages";

/// The chat connection: message delivery, presence, and the guild/member model.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver a message to a channel.
    async fn send_message(&self, channel: ChannelId, content: Outgoing) -> Result<(), HostError>;

    /// Set the presence text on every shard at once.
    async fn change_presence(&self, text: &str) -> Result<(), HostError>;

    /// Set the presence text on a single shard.
    async fn change_shard_presence(&self, shard: u64, text: &str) -> Result<(), HostError>;

    /// Active shard ids, 0-indexed.
    fn shard_ids(&self) -> Vec<u64>;

    /// True once the connection has been closed (e.g. after `logout`).
    fn is_closed(&self) -> bool;

    /// Leave a guild.
    async fn leave_guild(&self, guild: GuildId) -> Result<(), HostError>;

    /// Close the connection. Idempotent.
    async fn logout(&self) -> Result<(), HostError>;

    /// All guilds this connection is a member of.
    async fn guilds(&self) -> Vec<Guild>;

    /// Look up a single guild.
    async fn guild(&self, id: GuildId) -> Option<Guild>;

    /// The channel a guild-wide message should land in, if one resolves.
    async fn default_channel(&self, guild: GuildId) -> Option<Channel>;

    /// Look up a user by id.
    async fn user(&self, id: UserId) -> Option<User>;

    /// Members of a guild, with per-guild display names.
    async fn members_of(&self, guild: GuildId) -> Vec<Member>;
}

/// The persistent per-guild store this plugin backs up and tidies.
#[async_trait]
pub trait GuildStore: Send + Sync {
    /// The stored configuration blob for a guild, if any.
    async fn guild_data(&self, guild: GuildId) -> Result<Option<serde_json::Value>, HostError>;

    /// Delete records for every guild not in `live`. Returns the number deleted.
    async fn retain_guilds(&self, live: &[GuildId]) -> Result<usize, HostError>;

    /// Request a durable save of the whole store.
    async fn flush(&self) -> Result<(), HostError>;
}

/// The plugin-loading host.
#[async_trait]
pub trait PluginHost: Send + Sync {
    /// Current version string of a loaded plugin.
    async fn plugin_version(&self, name: &str) -> Option<String>;

    /// Reload a plugin in place. Returns whether the reload succeeded.
    async fn reload_plugin(&self, name: &str) -> bool;

    /// Opaque delegated refresh of another plugin's external data.
    async fn refresh_external_data(&self) -> Result<(), HostError>;
}

/// The translation/localization service.
#[async_trait]
pub trait Translations: Send + Sync {
    /// Resolve a translation key for a locale. Falls back host-side; always
    /// returns a displayable string.
    fn get(&self, key: &str, locale: &str) -> String;

    /// Reload translation data from disk.
    async fn reload(&self) -> Result<(), HostError>;
}

/// Counter sink for host-level statistics.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, counter: &str);
}
