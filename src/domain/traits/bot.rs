use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{Embed, GuildInfo, Message};

/// Bot trait - abstraction for the chat platform connection
#[async_trait]
pub trait Bot: Send + Sync {
    /// Start the bot and begin listening for events
    async fn start(&self) -> Result<(), BotError>;

    /// Send a plain message to a channel, returns the new message id
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError>;

    /// Send an embed with an optional button row
    async fn send_embed(
        &self,
        channel_id: &str,
        embed: &Embed,
        buttons: Vec<KeyboardButton>,
    ) -> Result<String, BotError>;

    /// Response only the invoking user can see
    async fn send_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        text: &str,
        embed: Option<&Embed>,
    ) -> Result<(), BotError>;

    /// Reply to a message with an embed
    async fn reply_embed(&self, channel_id: &str, message_id: &str, embed: &Embed) -> Result<String, BotError>;

    /// Reply to a message with a PNG attachment
    async fn reply_image(
        &self,
        channel_id: &str,
        message_id: &str,
        file_name: &str,
        png: &[u8],
    ) -> Result<String, BotError>;

    /// Replace an embed; `None` buttons removes the button row
    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
        buttons: Option<Vec<KeyboardButton>>,
    ) -> Result<(), BotError>;

    /// Most recent messages of a channel, newest first
    async fn fetch_history(&self, channel_id: &str, limit: usize) -> Result<Vec<Message>, BotError>;

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError>;

    async fn delete_channel(&self, channel_id: &str, reason: &str) -> Result<(), BotError>;

    /// Name and icon of a guild
    async fn guild_info(&self, guild_id: &str) -> Result<GuildInfo, BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Success,
    Secondary,
}

/// Interactive button attached to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardButton {
    pub label: String,
    pub custom_id: String,
    pub style: ButtonStyle,
}

impl KeyboardButton {
    pub fn new(label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            custom_id: custom_id.into(),
            style: ButtonStyle::Secondary,
        }
    }

    pub fn with_style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
