//! Cog trait definitions

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::errors::BotError;
use crate::application::messaging::parser::CommandArgs;
use crate::domain::entities::{ChannelInfo, Command, CommandKind, Embed, Message, User};
use crate::domain::traits::Bot;

/// What a handler gets to work with
pub struct CogContext<'a> {
    pub bot: &'a dyn Bot,
    pub now: DateTime<Utc>,
}

impl<'a> CogContext<'a> {
    pub fn new(bot: &'a dyn Bot, now: DateTime<Utc>) -> Self {
        Self { bot, now }
    }
}

/// A resolved command call
#[derive(Debug, Clone)]
pub struct Invocation {
    pub name: String,
    pub kind: CommandKind,
    pub args: CommandArgs,
    pub invoker: User,
    pub guild_id: Option<String>,
    pub channel_id: String,
    /// Message that carried a prefix command
    pub message_id: Option<String>,
}

impl Invocation {
    pub fn is_slash(&self) -> bool {
        self.kind == CommandKind::Slash
    }
}

/// A button on one of the bot's messages was pressed
#[derive(Debug, Clone)]
pub struct ButtonPress {
    pub custom_id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub user: User,
}

/// Response to the invoking user
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    None,
    /// Visible to everyone in the channel
    Public(String),
    /// Visible to the invoker only
    Ephemeral(String),
    EphemeralEmbed(Embed),
}

/// Core cog trait: a feature module that owns commands and listeners
#[async_trait]
pub trait Cog: Send + Sync {
    /// Unique identifier for the cog
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Commands this cog answers
    fn commands(&self) -> Vec<Command>;

    /// Restore persisted state
    async fn load(&mut self) -> Result<(), BotError> {
        Ok(())
    }

    async fn on_command(&mut self, ctx: &CogContext<'_>, invocation: &Invocation) -> Result<Reply, BotError>;

    async fn on_message(&mut self, _ctx: &CogContext<'_>, _message: &Message) -> Result<(), BotError> {
        Ok(())
    }

    async fn on_channel_create(&mut self, _ctx: &CogContext<'_>, _channel: &ChannelInfo) -> Result<(), BotError> {
        Ok(())
    }

    /// `None` when the button belongs to another cog
    async fn on_button(&mut self, _ctx: &CogContext<'_>, _press: &ButtonPress) -> Result<Option<Reply>, BotError> {
        Ok(None)
    }

    /// Periodic housekeeping
    async fn on_tick(&mut self, _ctx: &CogContext<'_>) -> Result<(), BotError> {
        Ok(())
    }
}
