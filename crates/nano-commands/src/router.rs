//! Command router and handlers.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use tracing::{debug, info, warn};

use nano_backup::BackupManager;
use nano_host::{
    ChatTransport, Embed, GuildId, GuildStore, IncomingMessage, MESSAGE_COUNTER, MetricsSink,
    Outgoing, PluginHost, Translations, User, UserId,
};

use crate::dispatch::{CommandKind, DispatchTable};
use crate::error::CommandError;
use crate::humanize::humanize_age;
use crate::signal::ShutdownSignal;
use crate::table::CommandTable;

/// Translation key for the owner-only denial.
const PERM_OWNER_KEY: &str = "PERM_OWNER";

/// Input fed to the fault-injection command. Parsing it as an integer is
/// the point: the failure exercises host-level fault reporting.
const FAULT_INPUT: &str = "abcdef";

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// The single identity permitted to invoke any command here.
    pub owner: UserId,
}

/// Parses inbound text, enforces owner authorization, and dispatches to a
/// fixed set of handlers. Two handlers record a [`ShutdownSignal`].
pub struct CommandRouter {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn GuildStore>,
    plugins: Arc<dyn PluginHost>,
    translations: Arc<dyn Translations>,
    metrics: Arc<dyn MetricsSink>,
    backup: Arc<BackupManager>,
    owner: UserId,
    table: CommandTable,
    dispatch: DispatchTable,
    shutdown: OnceLock<ShutdownSignal>,
}

impl CommandRouter {
    /// Build a router over the standard command and dispatch tables.
    /// Fails if the dispatch-table ordering invariant does not hold.
    pub fn new(
        config: RouterConfig,
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn GuildStore>,
        plugins: Arc<dyn PluginHost>,
        translations: Arc<dyn Translations>,
        metrics: Arc<dyn MetricsSink>,
        backup: Arc<BackupManager>,
    ) -> Result<Self, CommandError> {
        Ok(Self {
            transport,
            store,
            plugins,
            translations,
            metrics,
            backup,
            owner: config.owner,
            table: CommandTable::standard(),
            dispatch: DispatchTable::standard()?,
            shutdown: OnceLock::new(),
        })
    }

    /// The shutdown signal recorded by a handler, if any.
    pub fn shutdown_signal(&self) -> Option<ShutdownSignal> {
        self.shutdown.get().copied()
    }

    /// The command metadata table, for help rendering.
    pub fn command_table(&self) -> &CommandTable {
        &self.table
    }

    /// Route one inbound message.
    ///
    /// Returns `Ok(None)` for everything except the restart/exit commands,
    /// which return the recorded signal; the host must then stop
    /// delivering events and begin shutdown. The only `Err` is the
    /// deliberately unhandled diagnostic fault.
    pub async fn handle(
        &self,
        message: &IncomingMessage,
        prefix: &str,
        locale: &str,
    ) -> Result<Option<ShutdownSignal>, CommandError> {
        let Some(body) = self.table.match_body(&message.content, prefix) else {
            return Ok(None);
        };

        self.metrics.increment(MESSAGE_COUNTER);

        if message.author != self.owner {
            let denial = self.translations.get(PERM_OWNER_KEY, locale);
            self.reply(message, denial).await;
            return Ok(None);
        }

        let Some((kind, args)) = self.dispatch.resolve(body) else {
            // Valid top-level token with no routed handler (e.g. a bare
            // `nano.reload`): counted, gated, then dropped.
            debug!(body, "no dispatch entry for valid command");
            return Ok(None);
        };

        debug!(command = ?kind, "dispatching command");

        match kind {
            CommandKind::ServerInfo => self.server_info(message, args).await,
            CommandKind::TestException => {
                // Diagnostic fault: propagates unmodified to the host.
                let _: i64 = FAULT_INPUT.parse()?;
            }
            CommandKind::EmbedTest => self.embed_test(message).await,
            CommandKind::Backup => self.backup_now(message).await,
            CommandKind::LeaveServer => self.leave_server(message, args).await,
            CommandKind::ExternalDataRefresh => self.external_data_refresh(message).await,
            CommandKind::PluginReload => self.plugin_reload(message, args).await,
            CommandKind::TidyGuildRecords => self.tidy_guild_records().await,
            CommandKind::TranslationsReload => self.translations_reload(message).await,
            CommandKind::DefaultChannelProbe => self.default_channel_probe(message).await,
            CommandKind::Announce => self.announce(message, args).await,
            CommandKind::UserLookup => self.user_lookup(message, args).await,
            CommandKind::SetPlaying => self.set_playing(message, args).await,
            CommandKind::Restart => {
                return Ok(Some(
                    self.begin_shutdown(message, ShutdownSignal::Restart).await,
                ));
            }
            CommandKind::Kill => {
                return Ok(Some(self.begin_shutdown(message, ShutdownSignal::Exit).await));
            }
        }

        Ok(None)
    }

    /// Reply into the invoking channel. Delivery failures are logged, not
    /// surfaced: the command itself already ran.
    async fn reply(&self, message: &IncomingMessage, content: impl Into<Outgoing>) {
        if let Err(e) = self
            .transport
            .send_message(message.channel, content.into())
            .await
        {
            warn!(channel = %message.channel, error = %e, "reply delivery failed");
        }
    }

    async fn server_info(&self, message: &IncomingMessage, args: &str) {
        let guild = match args.trim().parse::<GuildId>() {
            Ok(id) => self.transport.guild(id).await,
            Err(_) => None,
        };

        let Some(guild) = guild else {
            self.reply(message, "No such guild. ✗").await;
            return;
        };

        let settings = match self.store.guild_data(guild.id).await {
            Ok(Some(value)) => value.to_string(),
            Ok(None) => "{}".to_string(),
            Err(e) => {
                warn!(guild = %guild.id, error = %e, "guild settings unavailable");
                "unavailable".to_string()
            }
        };

        let channels = guild
            .channels
            .iter()
            .map(|ch| ch.name.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let text = format!(
            "{}\n```css\nMember count: {}\nChannels: {}\nOwner: {}```\n*Settings*: ```{}```",
            guild.name, guild.member_count, channels, guild.owner_name, settings
        );
        self.reply(message, text).await;
    }

    async fn embed_test(&self, message: &IncomingMessage) {
        let embed = Embed::titled("Stats").field("Messages Sent", "sample messages");
        self.reply(message, Outgoing::rich_with_text("Stats", embed))
            .await;
    }

    async fn backup_now(&self, message: &IncomingMessage) {
        match self.backup.manual_backup().await {
            Ok(_) => self.reply(message, "Backup completed.").await,
            Err(e) => {
                warn!(error = %e, "manual backup failed");
                self.reply(message, "Backup failed, check the logs.").await;
            }
        }
    }

    async fn leave_server(&self, message: &IncomingMessage, args: &str) {
        let Ok(guild) = args.trim().parse::<GuildId>() else {
            self.reply(message, "Not a number.").await;
            return;
        };

        match self.transport.leave_guild(guild).await {
            Ok(()) => {
                info!(guild = %guild, "left guild");
                self.reply(message, format!("Left {guild}")).await;
            }
            Err(e) => {
                warn!(guild = %guild, error = %e, "could not leave guild");
                self.reply(message, format!("Could not leave {guild}: {e}"))
                    .await;
            }
        }
    }

    async fn external_data_refresh(&self, message: &IncomingMessage) {
        match self.plugins.refresh_external_data().await {
            Ok(()) => self.reply(message, "Re-downloaded external data.").await,
            Err(e) => {
                warn!(error = %e, "external data refresh failed");
                self.reply(message, "Refresh failed, check the logs.").await;
            }
        }
    }

    async fn plugin_reload(&self, message: &IncomingMessage, args: &str) {
        let name = args.trim();
        let old_version = self.plugins.plugin_version(name).await;
        let reloaded = self.plugins.reload_plugin(name).await;
        let new_version = self.plugins.plugin_version(name).await;

        if reloaded {
            let old_version = old_version.unwrap_or_else(|| "unknown".to_string());
            let new_version = new_version.unwrap_or_else(|| "unknown".to_string());
            info!(plugin = name, %old_version, %new_version, "plugin reloaded");
            self.reply(
                message,
                format!(
                    "Successfully reloaded **{name}**\nFrom version *{old_version}* to *{new_version}*."
                ),
            )
            .await;
        } else {
            warn!(plugin = name, "plugin reload failed");
            self.reply(message, "Something went wrong, check the logs.")
                .await;
        }
    }

    async fn tidy_guild_records(&self) {
        let live: Vec<GuildId> = self
            .transport
            .guilds()
            .await
            .into_iter()
            .map(|g| g.id)
            .collect();

        match self.store.retain_guilds(&live).await {
            Ok(deleted) => info!(deleted, live = live.len(), "tidied guild records"),
            Err(e) => warn!(error = %e, "guild record tidy failed"),
        }
    }

    async fn translations_reload(&self, message: &IncomingMessage) {
        match self.translations.reload().await {
            Ok(()) => self.reply(message, "Translations reloaded.").await,
            Err(e) => {
                warn!(error = %e, "translation reload failed");
                self.reply(message, "Reload failed, check the logs.").await;
            }
        }
    }

    async fn default_channel_probe(&self, message: &IncomingMessage) {
        let Some(guild) = message.guild else {
            self.reply(message, "Not in a guild.").await;
            return;
        };

        let Some(channel) = self.transport.default_channel(guild).await else {
            self.reply(message, "No default channel resolved.").await;
            return;
        };

        self.reply(
            message,
            format!("Default channel is #{}, sending a test message.", channel.name),
        )
        .await;

        if let Err(e) = self
            .transport
            .send_message(
                channel.id,
                Outgoing::text("This is a test message. Everything seems to be in order."),
            )
            .await
        {
            warn!(channel = %channel.id, error = %e, "default channel probe failed");
        }
    }

    async fn announce(&self, message: &IncomingMessage, args: &str) {
        let mut reached = 0usize;

        for guild in self.transport.guilds().await {
            let Some(channel) = self.transport.default_channel(guild.id).await else {
                warn!(guild = %guild.name, "no default channel, skipping announcement");
                continue;
            };

            match self
                .transport
                .send_message(channel.id, Outgoing::text(args))
                .await
            {
                Ok(()) => {
                    debug!(guild = %guild.name, "announcement delivered");
                    reached += 1;
                }
                Err(e) => {
                    warn!(guild = %guild.name, error = %e, "announcement delivery failed");
                }
            }
        }

        self.reply(message, format!("Sent to {reached} guilds")).await;
    }

    async fn user_lookup(&self, message: &IncomingMessage, args: &str) {
        let query = args.trim();

        let user = if !query.is_empty() && query.chars().all(|c| c.is_ascii_digit()) {
            let user = match query.parse::<UserId>() {
                Ok(id) => self.transport.user(id).await,
                Err(_) => None,
            };
            let Some(user) = user else {
                self.reply(message, "No user with that ID.").await;
                return;
            };
            user
        } else if let Some(&mention) = message.mentions.first() {
            let Some(user) = self.transport.user(mention).await else {
                self.reply(message, "No matching user found.").await;
                return;
            };
            user
        } else {
            let Some(user) = self.find_member_by_name(query).await else {
                self.reply(message, "No users with that name.").await;
                return;
            };
            user
        };

        let mut mutual = Vec::new();
        for guild in self.transport.guilds().await {
            if let Some(member) = self
                .transport
                .members_of(guild.id)
                .await
                .into_iter()
                .find(|m| m.user.id == user.id)
            {
                mutual.push(format!("{}: {}", guild.name, member.display_name));
            }
        }

        let age_secs = (Utc::now() - user.created_at).num_seconds();
        let title = if user.bot {
            format!("{} [bot]", user.name)
        } else {
            user.name.clone()
        };

        let embed = Embed::titled(title)
            .description(format!("ID: {}", user.id))
            .field(
                "Account created",
                format!(
                    "**{}** ago\nISO time: {}",
                    humanize_age(age_secs),
                    user.created_at
                ),
            )
            .field("Avatar url", user.avatar_url.clone())
            .field(
                "Guilds in common",
                format!("**{}**:\n{}", mutual.len(), mutual.join("\n")),
            );

        self.reply(message, Outgoing::rich(embed)).await;
    }

    /// Exact name match over the members of every known guild.
    async fn find_member_by_name(&self, name: &str) -> Option<User> {
        if name.is_empty() {
            return None;
        }

        for guild in self.transport.guilds().await {
            for member in self.transport.members_of(guild.id).await {
                if member.user.name == name {
                    return Some(member.user);
                }
            }
        }

        None
    }

    async fn set_playing(&self, message: &IncomingMessage, args: &str) {
        match self.transport.change_presence(args).await {
            Ok(()) => self.reply(message, "Status changed.").await,
            Err(e) => {
                warn!(error = %e, "presence change failed");
                self.reply(message, "Could not change status.").await;
            }
        }
    }

    /// Announce the shutdown, log the connection out, and record the
    /// signal. The first recorded signal wins for the whole process.
    async fn begin_shutdown(
        &self,
        message: &IncomingMessage,
        signal: ShutdownSignal,
    ) -> ShutdownSignal {
        let farewell = match signal {
            ShutdownSignal::Restart => "Shutting down, will be back.",
            ShutdownSignal::Exit => "Shutting down.",
        };
        self.reply(message, farewell).await;

        if let Err(e) = self.transport.logout().await {
            warn!(error = %e, "logout failed during shutdown");
        }

        if self.shutdown.set(signal).is_err() {
            warn!(?signal, "shutdown signal already recorded, keeping the first");
        }
        info!(?signal, "shutdown requested");

        signal
    }
}
