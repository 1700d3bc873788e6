use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Embed, User};

/// Base of message permalinks
const PERMALINK_BASE: &str = "https://discord.com/channels";

/// Message content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Content {
    Text(String),
    Command { name: String, args: Vec<String> },
    #[default]
    Empty,
}

/// A message as delivered by the platform adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(id: impl Into<String>, channel_id: impl Into<String>, author: User) -> Self {
        Self {
            id: id.into(),
            guild_id: None,
            channel_id: channel_id.into(),
            author,
            content: String::new(),
            embeds: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Body text followed by the last embed's title and description
    pub fn combined_text(&self) -> String {
        let mut text = self.content.clone();
        if let Some(embed) = self.embeds.last() {
            text.push('\n');
            text.push_str(embed.title.as_deref().unwrap_or(""));
            text.push('\n');
            text.push_str(embed.description.as_deref().unwrap_or(""));
        }
        text
    }

    /// Normalizes the message into the shape the payout detector reads
    pub fn to_candidate(&self) -> CandidateMessage {
        let mut candidate =
            CandidateMessage::new(&self.id, &self.channel_id, &self.author.id, self.combined_text());
        candidate.guild_id = self.guild_id.clone();
        candidate
    }
}

/// Normalized text of one message plus the ids needed to link back to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMessage {
    pub id: String,
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub author_id: String,
    pub text: String,
}

impl CandidateMessage {
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            guild_id: None,
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            text: text.into(),
        }
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Jump link to the message; `None` outside a guild
    pub fn permalink(&self) -> Option<String> {
        self.guild_id
            .as_ref()
            .map(|guild| format!("{}/{}/{}/{}", PERMALINK_BASE, guild, self.channel_id, self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_text_uses_last_embed() {
        let msg = Message::new("1", "2", User::new("3"))
            .with_content("body")
            .with_embed(Embed::new("first").with_description("ignored"))
            .with_embed(Embed::new("Amazing job everybody").with_description("details"));

        assert_eq!(msg.combined_text(), "body\nAmazing job everybody\ndetails");
    }

    #[test]
    fn test_combined_text_without_embeds() {
        let msg = Message::new("1", "2", User::new("3")).with_content("just text");
        assert_eq!(msg.combined_text(), "just text");
    }

    #[test]
    fn test_embed_without_title() {
        let mut embed = Embed::default();
        embed.description = Some("desc".to_string());
        let msg = Message::new("1", "2", User::new("3")).with_embed(embed);
        assert_eq!(msg.combined_text(), "\n\ndesc");
    }

    #[test]
    fn test_permalink() {
        let msg = Message::new("30", "20", User::new("3")).with_guild("10");
        assert_eq!(
            msg.to_candidate().permalink().as_deref(),
            Some("https://discord.com/channels/10/20/30")
        );

        let dm = Message::new("30", "20", User::new("3"));
        assert_eq!(dm.to_candidate().permalink(), None);
    }
}
