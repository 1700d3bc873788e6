//! Event dispatcher - Routes platform events to the cogs

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use super::parser::{CommandArgs, MessageParser};
use crate::application::errors::{BotError, CommandError};
use crate::cogs::manager::CogManager;
use crate::cogs::trait_def::{ButtonPress, CogContext, Invocation, Reply};
use crate::domain::entities::{ChannelInfo, CommandKind, Content, Message, User};
use crate::domain::traits::Bot;

const FAILURE_TEXT: &str = "Something went wrong while running that command.";

/// Everything the platform can tell the bot about
#[derive(Debug, Clone)]
pub enum Event {
    MessageCreated(Message),
    /// Slash command typed as `/name key:value ...`
    SlashCommand {
        text: String,
        user: User,
        guild_id: Option<String>,
        channel_id: String,
    },
    ChannelCreated(ChannelInfo),
    ButtonPressed(ButtonPress),
    Tick,
}

/// Routes events to the cogs and delivers their replies
pub struct EventDispatcher {
    parser: MessageParser,
    cogs: CogManager,
}

impl EventDispatcher {
    pub fn new(prefix: impl Into<String>, cogs: CogManager) -> Self {
        Self {
            parser: MessageParser::new(prefix),
            cogs,
        }
    }

    pub fn cogs(&self) -> &CogManager {
        &self.cogs
    }

    /// Process one event to completion
    pub async fn dispatch(&mut self, bot: &dyn Bot, event: Event, now: DateTime<Utc>) -> Result<(), BotError> {
        let ctx = CogContext::new(bot, now);

        match event {
            Event::MessageCreated(message) => {
                if message.author.id == bot.bot_info().id {
                    return Ok(());
                }
                self.cogs.on_message(&ctx, &message).await;

                let (kind, content) = self.parser.parse(&message.content);
                if let (Some(CommandKind::Prefix), Content::Command { name, args }) = (kind, content) {
                    let invocation = Invocation {
                        name,
                        kind: CommandKind::Prefix,
                        args: CommandArgs::new(CommandKind::Prefix, args),
                        invoker: message.author.clone(),
                        guild_id: message.guild_id.clone(),
                        channel_id: message.channel_id.clone(),
                        message_id: Some(message.id.clone()),
                    };
                    self.run_command(&ctx, invocation).await?;
                }
                Ok(())
            }
            Event::SlashCommand { text, user, guild_id, channel_id } => {
                match self.parser.parse(&text) {
                    (Some(CommandKind::Slash), Content::Command { name, args }) => {
                        let invocation = Invocation {
                            name,
                            kind: CommandKind::Slash,
                            args: CommandArgs::new(CommandKind::Slash, args),
                            invoker: user,
                            guild_id,
                            channel_id,
                            message_id: None,
                        };
                        self.run_command(&ctx, invocation).await
                    }
                    _ => {
                        warn!("Not a slash command: {}", text);
                        Ok(())
                    }
                }
            }
            Event::ChannelCreated(channel) => {
                self.cogs.on_channel_create(&ctx, &channel).await;
                Ok(())
            }
            Event::ButtonPressed(press) => {
                let reply = match self.cogs.on_button(&ctx, &press).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        error!("Button '{}' failed: {}", press.custom_id, e);
                        Some(Reply::Ephemeral(FAILURE_TEXT.to_string()))
                    }
                };
                if let Some(reply) = reply {
                    deliver(bot, &press.channel_id, &press.user, reply, true).await?;
                }
                Ok(())
            }
            Event::Tick => {
                self.cogs.on_tick(&ctx).await;
                Ok(())
            }
        }
    }

    async fn run_command(&mut self, ctx: &CogContext<'_>, invocation: Invocation) -> Result<(), BotError> {
        debug!("Running {:?} command '{}' for {}", invocation.kind, invocation.name, invocation.invoker);
        let slash = invocation.is_slash();

        let reply = match self.cogs.dispatch_command(ctx, &invocation).await {
            Ok(reply) => reply,
            Err(BotError::Command(CommandError::NotFound(name))) if !slash => {
                debug!("No cog handles prefix command '{}'", name);
                Reply::None
            }
            Err(BotError::Command(e)) => {
                debug!("Command '{}' rejected: {}", invocation.name, e);
                if slash {
                    Reply::Ephemeral(e.to_string())
                } else {
                    Reply::Public(e.to_string())
                }
            }
            Err(e) => {
                error!("Command '{}' failed: {}", invocation.name, e);
                Reply::Ephemeral(FAILURE_TEXT.to_string())
            }
        };

        deliver(ctx.bot, &invocation.channel_id, &invocation.invoker, reply, slash).await
    }
}

/// Ephemeral replies only exist for interactions; prefix commands answer in channel
async fn deliver(bot: &dyn Bot, channel_id: &str, user: &User, reply: Reply, interaction: bool) -> Result<(), BotError> {
    match reply {
        Reply::None => Ok(()),
        Reply::Public(text) => bot.send_message(channel_id, &text).await.map(|_| ()),
        Reply::Ephemeral(text) if interaction => bot.send_ephemeral(channel_id, &user.id, &text, None).await,
        Reply::Ephemeral(text) => bot.send_message(channel_id, &text).await.map(|_| ()),
        Reply::EphemeralEmbed(embed) if interaction => bot.send_ephemeral(channel_id, &user.id, "", Some(&embed)).await,
        Reply::EphemeralEmbed(embed) => bot.send_embed(channel_id, &embed, Vec::new()).await.map(|_| ()),
    }
}
