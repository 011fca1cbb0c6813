//! Ordered literal-prefix dispatch.
//!
//! Replaces a fixed if/else matching chain with an explicit ordered table.
//! The ordering invariant — no token is an unintended prefix of a later
//! token — is checked at construction instead of being relied on
//! implicitly.

use crate::CommandError;

/// Identifies the handler a message body routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ServerInfo,
    TestException,
    EmbedTest,
    Backup,
    LeaveServer,
    ExternalDataRefresh,
    PluginReload,
    TidyGuildRecords,
    TranslationsReload,
    DefaultChannelProbe,
    Announce,
    UserLookup,
    SetPlaying,
    Restart,
    Kill,
}

/// One dispatchable command: a literal token and its handler id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    pub token: &'static str,
    pub kind: CommandKind,
}

impl DispatchEntry {
    pub const fn new(token: &'static str, kind: CommandKind) -> Self {
        Self { token, kind }
    }
}

/// Ordered dispatch table. The first entry whose token is a prefix of the
/// message body wins; the remainder becomes the argument string.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    entries: Vec<DispatchEntry>,
}

impl DispatchTable {
    /// Build a table, enforcing the ordering invariant: when one token is
    /// a strict prefix of another, the longer token must be listed first,
    /// so the shorter one cannot intercept it.
    pub fn new(entries: Vec<DispatchEntry>) -> Result<Self, CommandError> {
        for (i, earlier) in entries.iter().enumerate() {
            for later in &entries[i + 1..] {
                if later.token == earlier.token {
                    return Err(CommandError::DuplicateCommand(earlier.token.to_string()));
                }
                if later.token.starts_with(earlier.token) {
                    return Err(CommandError::ShadowedCommand {
                        shorter: earlier.token.to_string(),
                        longer: later.token.to_string(),
                    });
                }
            }
        }

        Ok(Self { entries })
    }

    /// The standard table for the developer plugin.
    pub fn standard() -> Result<Self, CommandError> {
        use CommandKind::*;

        Self::new(vec![
            DispatchEntry::new("nano.dev.server_info", ServerInfo),
            DispatchEntry::new("nano.dev.test_exception", TestException),
            DispatchEntry::new("nano.dev.embed_test", EmbedTest),
            DispatchEntry::new("nano.dev.backup", Backup),
            DispatchEntry::new("nano.dev.leave_server", LeaveServer),
            DispatchEntry::new("nano.dev.tf.clean", ExternalDataRefresh),
            DispatchEntry::new("nano.dev.plugin.reload", PluginReload),
            DispatchEntry::new("nano.dev.servers.tidy", TidyGuildRecords),
            DispatchEntry::new("nano.dev.translations.reload", TranslationsReload),
            DispatchEntry::new("nano.dev.test_default_channel", DefaultChannelProbe),
            DispatchEntry::new("nano.dev.announce", Announce),
            DispatchEntry::new("nano.dev.userdetective", UserLookup),
            DispatchEntry::new("nano.playing", SetPlaying),
            DispatchEntry::new("nano.restart", Restart),
            DispatchEntry::new("nano.kill", Kill),
        ])
    }

    /// Resolve a message body (prefix already stripped) to a handler and
    /// its argument string, with leading whitespace trimmed.
    pub fn resolve<'a>(&self, body: &'a str) -> Option<(CommandKind, &'a str)> {
        self.entries
            .iter()
            .find(|entry| body.starts_with(entry.token))
            .map(|entry| (entry.kind, body[entry.token.len()..].trim_start()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_well_ordered() {
        assert!(DispatchTable::standard().is_ok());
    }

    #[test]
    fn shadowed_token_is_rejected() {
        let err = DispatchTable::new(vec![
            DispatchEntry::new("nano.dev", CommandKind::Backup),
            DispatchEntry::new("nano.dev.backup", CommandKind::Backup),
        ]);

        assert!(matches!(
            err,
            Err(CommandError::ShadowedCommand { shorter, longer })
                if shorter == "nano.dev" && longer == "nano.dev.backup"
        ));
    }

    #[test]
    fn longer_token_listed_first_is_accepted() {
        let table = DispatchTable::new(vec![
            DispatchEntry::new("nano.dev.backup", CommandKind::Backup),
            DispatchEntry::new("nano.dev", CommandKind::ServerInfo),
        ])
        .unwrap();

        let (kind, rest) = table.resolve("nano.dev.backup now").unwrap();
        assert_eq!(kind, CommandKind::Backup);
        assert_eq!(rest, "now");

        let (kind, _) = table.resolve("nano.dev.other").unwrap();
        assert_eq!(kind, CommandKind::ServerInfo);
    }

    #[test]
    fn duplicate_token_is_rejected() {
        let err = DispatchTable::new(vec![
            DispatchEntry::new("nano.kill", CommandKind::Kill),
            DispatchEntry::new("nano.kill", CommandKind::Restart),
        ]);

        assert!(matches!(err, Err(CommandError::DuplicateCommand(t)) if t == "nano.kill"));
    }

    #[test]
    fn sibling_tokens_do_not_cross_match() {
        let table = DispatchTable::standard().unwrap();

        let (kind, _) = table.resolve("nano.dev.tf.clean").unwrap();
        assert_eq!(kind, CommandKind::ExternalDataRefresh);

        let (kind, _) = table.resolve("nano.dev.translations.reload").unwrap();
        assert_eq!(kind, CommandKind::TranslationsReload);
    }

    #[test]
    fn remainder_is_trimmed() {
        let table = DispatchTable::standard().unwrap();
        let (kind, rest) = table.resolve("nano.dev.leave_server 42").unwrap();
        assert_eq!(kind, CommandKind::LeaveServer);
        assert_eq!(rest, "42");
    }

    #[test]
    fn unrouted_body_resolves_to_none() {
        let table = DispatchTable::standard().unwrap();
        assert!(table.resolve("nano.reload").is_none());
        assert!(table.resolve("nano.dev").is_none());
    }
}
