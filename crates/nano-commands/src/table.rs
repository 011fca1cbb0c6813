//! Top-level command metadata.
//!
//! The table drives the validity check and the help surface only;
//! dispatch matches the literal tokens in [`crate::DispatchTable`]
//! independently. A message can therefore pass validity (e.g. a bare
//! `nano.reload`) without reaching any handler.

use serde::{Deserialize, Serialize};

/// Metadata for one top-level command token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub token: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl CommandSpec {
    fn new(token: &str, description: &str) -> Self {
        Self {
            token: token.to_string(),
            description: description.to_string(),
            usage: None,
            aliases: Vec::new(),
        }
    }

    fn usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }
}

/// Read-only table of the top-level tokens this router recognizes.
#[derive(Debug, Clone)]
pub struct CommandTable {
    specs: Vec<CommandSpec>,
}

impl CommandTable {
    /// The standard table for the developer plugin.
    pub fn standard() -> Self {
        Self {
            specs: vec![
                CommandSpec::new("nano.dev", "Developer commands, restricted."),
                CommandSpec::new("nano.playing", "Restricted to owner, changes the playing status.")
                    .usage("[command] [status]"),
                CommandSpec::new("nano.restart", "Restricted to owner, restarts the bot.")
                    .usage("[command]"),
                CommandSpec::new("nano.reload", "Restricted to owner, reloads settings.")
                    .alias("_reload"),
                CommandSpec::new("nano.kill", "Restricted to owner, shuts down the bot.")
                    .usage("[command]"),
            ],
        }
    }

    /// All specs, for help rendering.
    pub fn specs(&self) -> &[CommandSpec] {
        &self.specs
    }

    /// If `content` starts with `prefix` followed by a recognized token or
    /// alias, return the message body with the prefix stripped.
    pub fn match_body<'a>(&self, content: &'a str, prefix: &str) -> Option<&'a str> {
        let body = content.strip_prefix(prefix)?;
        let recognized = self.specs.iter().any(|spec| {
            body.starts_with(spec.token.as_str())
                || spec.aliases.iter().any(|alias| body.starts_with(alias.as_str()))
        });
        recognized.then_some(body)
    }
}
