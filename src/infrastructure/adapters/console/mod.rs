//! Console adapter for development/testing
//!
//! Keeps channel history and guild details in memory and records everything
//! the bot sends, printing it to stdout when echo is on.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::application::errors::BotError;
use crate::application::messaging::Event;
use crate::cogs::ButtonPress;
use crate::domain::entities::{ChannelInfo, Embed, GuildInfo, Message, User};
use crate::domain::traits::{Bot, BotInfo, KeyboardButton};

/// Something the bot did through the adapter
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text { channel_id: String, message_id: String, text: String },
    Embed { channel_id: String, message_id: String, embed: Embed, buttons: Vec<KeyboardButton> },
    Ephemeral { channel_id: String, user_id: String, text: String, embed: Option<Embed> },
    ReplyEmbed { channel_id: String, reply_to: String, embed: Embed },
    ReplyImage { channel_id: String, reply_to: String, file_name: String, png: Vec<u8> },
    Edit { channel_id: String, message_id: String, embed: Embed, buttons: Option<Vec<KeyboardButton>> },
    DeleteMessage { channel_id: String, message_id: String },
    DeleteChannel { channel_id: String, reason: String },
}

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    echo: bool,
    fail_uploads: bool,
    history: Mutex<HashMap<String, Vec<Message>>>,
    guilds: Mutex<HashMap<String, GuildInfo>>,
    outbox: Mutex<Vec<Outbound>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "heist-bot".to_string(),
                username: "console".to_string(),
            },
            echo: false,
            fail_uploads: false,
            history: Mutex::new(HashMap::new()),
            guilds: Mutex::new(HashMap::new()),
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Print outbound traffic to stdout
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Make every image reply fail, as a platform upload error would
    pub fn with_upload_failure(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn with_guild(self, guild: GuildInfo) -> Self {
        if let Ok(mut guilds) = self.guilds.lock() {
            guilds.insert(guild.id.clone(), guild);
        }
        self
    }

    /// Appends a message to its channel history (oldest first)
    pub fn record(&self, message: Message) -> Result<(), BotError> {
        lock(&self.history)?
            .entry(message.channel_id.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    /// Snapshot of everything sent so far
    pub fn sent(&self) -> Vec<Outbound> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Drains the recorded outbound traffic
    pub fn take_sent(&self) -> Vec<Outbound> {
        self.outbox
            .lock()
            .map(|mut o| std::mem::take(&mut *o))
            .unwrap_or_default()
    }

    fn push(&self, outbound: Outbound) -> Result<(), BotError> {
        if self.echo {
            print_outbound(&outbound);
        }
        lock(&self.outbox)?.push(outbound);
        Ok(())
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, BotError> {
    mutex.lock().map_err(|_| BotError::Internal("Lock poisoned".to_string()))
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn print_embed(embed: &Embed) {
    if let Some(title) = &embed.title {
        println!("  ┃ {}", title);
    }
    if let Some(description) = &embed.description {
        for line in description.lines() {
            println!("  ┃ {}", line);
        }
    }
    if let Some(footer) = &embed.footer {
        println!("  ┃ - {}", footer.text);
    }
}

fn print_buttons(buttons: &[KeyboardButton]) {
    if !buttons.is_empty() {
        let row: Vec<String> = buttons.iter().map(|b| format!("[{}]", b.label)).collect();
        println!("  {}", row.join(" "));
    }
}

fn print_outbound(outbound: &Outbound) {
    match outbound {
        Outbound::Text { channel_id, text, .. } => println!("[BOT #{}] {}", channel_id, text),
        Outbound::Embed { channel_id, embed, buttons, .. } => {
            println!("[BOT #{}] embed", channel_id);
            print_embed(embed);
            print_buttons(buttons);
        }
        Outbound::Ephemeral { channel_id, user_id, text, embed } => {
            println!("[BOT #{} -> {} only] {}", channel_id, user_id, text);
            if let Some(embed) = embed {
                print_embed(embed);
            }
        }
        Outbound::ReplyEmbed { channel_id, reply_to, embed } => {
            println!("[BOT #{}] reply to {}", channel_id, reply_to);
            print_embed(embed);
        }
        Outbound::ReplyImage { channel_id, reply_to, file_name, png } => {
            println!("[BOT #{}] reply to {} with {} ({} bytes)", channel_id, reply_to, file_name, png.len());
        }
        Outbound::Edit { channel_id, message_id, embed, buttons } => {
            println!("[BOT #{}] edit {}", channel_id, message_id);
            print_embed(embed);
            if let Some(buttons) = buttons {
                print_buttons(buttons);
            }
        }
        Outbound::DeleteMessage { channel_id, message_id } => {
            println!("[BOT #{}] delete message {}", channel_id, message_id);
        }
        Outbound::DeleteChannel { channel_id, reason } => {
            println!("[BOT] delete channel {} ({})", channel_id, reason);
        }
    }
}

/// Turns typed console lines into platform events.
///
/// - `@payout <text>` posts as the payout bot (`\n` becomes a newline)
/// - `/name key:value ...` runs a slash command
/// - `+channel <id> [category]` announces a new text channel
/// - `#press <custom_id>` presses a button
/// - `#tick` runs the periodic housekeeping now
/// - anything else is a message from the console user
pub struct ConsoleSession {
    guild_id: String,
    channel_id: String,
    user: User,
    payout_bot: User,
    next_id: u64,
}

impl ConsoleSession {
    pub fn new(guild_id: impl Into<String>, channel_id: impl Into<String>, payout_bot_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
            user: User::new("console-user").with_username("console").as_admin(),
            payout_bot: User::new(payout_bot_id).with_username("payout-bot").as_bot(),
            next_id: 1,
        }
    }

    /// Start numbering new messages after `last`
    pub fn continue_after(&mut self, last: u64) {
        self.next_id = self.next_id.max(last + 1);
    }

    fn message(&mut self, author: User, text: &str) -> Message {
        let id = self.next_id;
        self.next_id += 1;
        Message::new(id.to_string(), &self.channel_id, author)
            .with_guild(&self.guild_id)
            .with_content(text.replace("\\n", "\n"))
    }

    pub fn event_for(&mut self, line: &str) -> Option<Event> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(text) = line.strip_prefix("@payout ") {
            let author = self.payout_bot.clone();
            return Some(Event::MessageCreated(self.message(author, text)));
        }
        if line.starts_with('/') {
            return Some(Event::SlashCommand {
                text: line.to_string(),
                user: self.user.clone(),
                guild_id: Some(self.guild_id.clone()),
                channel_id: self.channel_id.clone(),
            });
        }
        if let Some(rest) = line.strip_prefix("+channel ") {
            let mut parts = rest.split_whitespace();
            let id = parts.next()?;
            let mut channel = ChannelInfo::text(id, &self.guild_id, format!("channel-{}", id));
            if let Some(category) = parts.next() {
                channel = channel.in_category(category);
            }
            return Some(Event::ChannelCreated(channel));
        }
        if let Some(custom_id) = line.strip_prefix("#press ") {
            return Some(Event::ButtonPressed(ButtonPress {
                custom_id: custom_id.trim().to_string(),
                channel_id: self.channel_id.clone(),
                guild_id: Some(self.guild_id.clone()),
                user: self.user.clone(),
            }));
        }
        if line == "#tick" {
            return Some(Event::Tick);
        }

        let author = self.user.clone();
        Some(Event::MessageCreated(self.message(author, line)))
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        let message_id = new_message_id();
        self.push(Outbound::Text {
            channel_id: channel_id.to_string(),
            message_id: message_id.clone(),
            text: text.to_string(),
        })?;
        Ok(message_id)
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed, buttons: Vec<KeyboardButton>) -> Result<String, BotError> {
        let message_id = new_message_id();
        self.push(Outbound::Embed {
            channel_id: channel_id.to_string(),
            message_id: message_id.clone(),
            embed: embed.clone(),
            buttons,
        })?;
        Ok(message_id)
    }

    async fn send_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        text: &str,
        embed: Option<&Embed>,
    ) -> Result<(), BotError> {
        self.push(Outbound::Ephemeral {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            text: text.to_string(),
            embed: embed.cloned(),
        })
    }

    async fn reply_embed(&self, channel_id: &str, message_id: &str, embed: &Embed) -> Result<String, BotError> {
        self.push(Outbound::ReplyEmbed {
            channel_id: channel_id.to_string(),
            reply_to: message_id.to_string(),
            embed: embed.clone(),
        })?;
        Ok(new_message_id())
    }

    async fn reply_image(
        &self,
        channel_id: &str,
        message_id: &str,
        file_name: &str,
        png: &[u8],
    ) -> Result<String, BotError> {
        if self.fail_uploads {
            return Err(BotError::Network(format!("upload of {} rejected", file_name)));
        }
        self.push(Outbound::ReplyImage {
            channel_id: channel_id.to_string(),
            reply_to: message_id.to_string(),
            file_name: file_name.to_string(),
            png: png.to_vec(),
        })?;
        Ok(new_message_id())
    }

    async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
        buttons: Option<Vec<KeyboardButton>>,
    ) -> Result<(), BotError> {
        self.push(Outbound::Edit {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            embed: embed.clone(),
            buttons,
        })
    }

    async fn fetch_history(&self, channel_id: &str, limit: usize) -> Result<Vec<Message>, BotError> {
        let history = lock(&self.history)?;
        Ok(history
            .get(channel_id)
            .map(|msgs| msgs.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError> {
        if let Some(msgs) = lock(&self.history)?.get_mut(channel_id) {
            msgs.retain(|m| m.id != message_id);
        }
        self.push(Outbound::DeleteMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        })
    }

    async fn delete_channel(&self, channel_id: &str, reason: &str) -> Result<(), BotError> {
        lock(&self.history)?.remove(channel_id);
        self.push(Outbound::DeleteChannel {
            channel_id: channel_id.to_string(),
            reason: reason.to_string(),
        })
    }

    async fn guild_info(&self, guild_id: &str) -> Result<GuildInfo, BotError> {
        lock(&self.guilds)?
            .get(guild_id)
            .cloned()
            .ok_or_else(|| BotError::NotFound(format!("guild {}", guild_id)))
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
