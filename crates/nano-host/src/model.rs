//! Shared chat model types.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snowflake identifier of a guild.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GuildId(pub u64);

/// Snowflake identifier of a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Snowflake identifier of a channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

macro_rules! id_impls {
    ($($ty:ident),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }

            impl FromStr for $ty {
                type Err = ParseIntError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.parse::<u64>().map($ty)
                }
            }

            impl From<u64> for $ty {
                fn from(raw: u64) -> Self {
                    $ty(raw)
                }
            }
        )*
    };
}

id_impls!(GuildId, UserId, ChannelId);

/// A chat user as known to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// True for accounts operated by other bots.
    pub bot: bool,
    /// When the account was created (drives the account-age display).
    pub created_at: DateTime<Utc>,
    pub avatar_url: String,
}

/// A guild member: a user plus their per-guild display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    pub display_name: String,
}

/// A text channel inside a guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
}

/// A guild snapshot as reported by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
    pub owner_name: String,
    pub member_count: u64,
    pub channels: Vec<Channel>,
}

/// An inbound message delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub content: String,
    pub author: UserId,
    pub channel: ChannelId,
    /// Absent for direct messages.
    pub guild: Option<GuildId>,
    /// Users mentioned in the message, in order of appearance.
    pub mentions: Vec<UserId>,
}

/// One titled field of a structured reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// A structured (rich) reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    /// Create an embed with a title and no fields.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a named field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Outbound message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outgoing {
    Text(String),
    /// A rich reply, optionally preceded by plain text.
    Rich {
        text: Option<String>,
        embed: Embed,
    },
}

impl From<&str> for Outgoing {
    fn from(content: &str) -> Self {
        Outgoing::Text(content.to_string())
    }
}

impl From<String> for Outgoing {
    fn from(content: String) -> Self {
        Outgoing::Text(content)
    }
}

impl Outgoing {
    pub fn text(content: impl Into<String>) -> Self {
        Outgoing::Text(content.into())
    }

    pub fn rich(embed: Embed) -> Self {
        Outgoing::Rich { text: None, embed }
    }

    pub fn rich_with_text(text: impl Into<String>, embed: Embed) -> Self {
        Outgoing::Rich {
            text: Some(text.into()),
            embed,
        }
    }
}
