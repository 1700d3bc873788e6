//! Spree cog: temporary channels that delete themselves
//!
//! Text channels created inside a monitored category get a countdown embed
//! with Extend and Dismiss buttons. The tick deletes channels whose
//! countdown ran out and refreshes the embeds of the rest.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::errors::{BotError, CommandError};
use crate::application::messaging::parser::parse_channel_ref;
use crate::cogs::trait_def::{ButtonPress, Cog, CogContext, Invocation, Reply};
use crate::domain::duration::{parse_time_string, DurationParseError};
use crate::domain::entities::{
    deadline_after, ChannelInfo, ChannelKind, Color, Command, Embed, Permission, SpreeChannel, SpreeState,
};
use crate::domain::traits::{ButtonStyle, KeyboardButton, Store};

/// Store key of the spree document
pub const SPREE_KEY: &str = "spree_data";

pub const EXTEND_SECONDS: u64 = 3_600;

const BUTTON_PREFIX: &str = "spree";
const FOOTER_TEXT: &str = "Extend or dismiss auto-delete below.";
const GONE_TEXT: &str = "Auto-delete is already dismissed or ended.";
const EXTEND_LIMIT_TEXT: &str = "❌ This channel cannot be extended any further.";

/// Countdown embed for a live channel
pub fn countdown_embed(end_time: DateTime<Utc>, icon_url: Option<String>, now: DateTime<Utc>) -> Embed {
    Embed::new("⏰ Temporary Channel")
        .with_description(format!("This channel will be deleted <t:{}:R>.", end_time.timestamp()))
        .with_color(Color::GOLD)
        .with_footer(FOOTER_TEXT, icon_url)
        .with_timestamp(now)
}

/// Countdown embed once auto-delete was dismissed
pub fn dismissed_embed(end_time: DateTime<Utc>, icon_url: Option<String>, now: DateTime<Utc>) -> Embed {
    Embed::new("Temporary Channel")
        .with_description(format!(
            "~~This channel will be deleted <t:{}:R>~~\n**This channel will NOT be deleted**",
            end_time.timestamp()
        ))
        .with_color(Color::RED)
        .with_footer(FOOTER_TEXT, icon_url)
        .with_timestamp(now)
}

pub fn countdown_buttons(channel_id: &str) -> Vec<KeyboardButton> {
    vec![
        KeyboardButton::new("Extend 1h", format!("{}:extend:{}", BUTTON_PREFIX, channel_id))
            .with_style(ButtonStyle::Success),
        KeyboardButton::new("Dismiss", format!("{}:dismiss:{}", BUTTON_PREFIX, channel_id)),
    ]
}

fn help_embed(prefix: &str) -> Embed {
    Embed::new("Spree Channels Help")
        .with_description(format!(
            "**/spree_categories_add <category> <del_time>** or `{p}spree_cat_add`\n\
             Monitor a category; new text channels in it are deleted after `del_time` (`10s`, `5m`, `1h30m`, `2d`).\n\n\
             **/spree_categories_remove <category>** or `{p}spree_cat_remove`\n\
             Stop monitoring a category.\n\n\
             Every temporary channel gets a countdown with **Extend 1h** and **Dismiss** buttons.",
            p = prefix
        ))
        .with_color(Color::BLURPLE)
        .with_footer("Spree ephemeral channels system", None)
}

pub struct SpreeCog {
    store: Arc<dyn Store>,
    state: SpreeState,
    prefix: String,
}

impl SpreeCog {
    pub fn new(store: Arc<dyn Store>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            state: SpreeState::default(),
            prefix: prefix.into(),
        }
    }

    pub fn state(&self) -> &SpreeState {
        &self.state
    }

    async fn save(&self) {
        let result = match serde_json::to_string_pretty(&self.state) {
            Ok(raw) => self.store.set(SPREE_KEY, &raw).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            error!("Failed to save spree data: {}", e);
        }
    }

    async fn icon_url(ctx: &CogContext<'_>, guild_id: Option<&str>) -> Option<String> {
        let guild_id = guild_id?;
        match ctx.bot.guild_info(guild_id).await {
            Ok(guild) => guild.icon_url,
            Err(e) => {
                warn!("Could not look up guild {}: {}", guild_id, e);
                None
            }
        }
    }

    async fn add_category(&mut self, ctx: &CogContext<'_>, invocation: &Invocation) -> Result<Reply, BotError> {
        let category = invocation
            .args
            .get("category", 0)
            .and_then(parse_channel_ref)
            .ok_or_else(|| CommandError::InvalidArgs("Please give a category id or mention.".to_string()))?;
        let del_time = if invocation.is_slash() {
            invocation.args.get("del_time", 1).map(str::to_string)
        } else {
            invocation.args.rest(1)
        }
        .unwrap_or_default();

        let seconds = match parse_time_string(&del_time) {
            Ok(seconds) if deadline_after(ctx.now, seconds).is_some() => seconds,
            Ok(_) => return Ok(Reply::Ephemeral(format!("❌ {}", DurationParseError::InvalidFormat))),
            Err(e) => return Ok(Reply::Ephemeral(format!("❌ {}", e))),
        };

        self.state.ephemeral_categories.insert(category.clone(), seconds);
        self.save().await;
        info!("Monitoring category {} with {}s auto-delete", category, seconds);

        let text = if invocation.is_slash() {
            format!("✅ Category **<#{}>** is now monitored. Default auto-delete: {}.", category, del_time)
        } else {
            format!("✅ Category **<#{}>** is now ephemeral with default time {}.", category, del_time)
        };
        Ok(Reply::Ephemeral(text))
    }

    async fn remove_category(&mut self, invocation: &Invocation) -> Result<Reply, BotError> {
        let category = invocation
            .args
            .get("category", 0)
            .and_then(parse_channel_ref)
            .ok_or_else(|| CommandError::InvalidArgs("Please give a category id or mention.".to_string()))?;

        let removed = self.state.ephemeral_categories.remove(&category).is_some();
        if removed {
            self.save().await;
            info!("Stopped monitoring category {}", category);
        }

        let text = match (removed, invocation.is_slash()) {
            (true, true) => format!("✅ Category **<#{}>** is no longer monitored.", category),
            (false, true) => format!("❌ Category **<#{}>** was not monitored.", category),
            (true, false) => format!("✅ Category **<#{}>** is no longer ephemeral.", category),
            (false, false) => format!("❌ Category **<#{}>** was not ephemeral.", category),
        };
        Ok(Reply::Ephemeral(text))
    }

    async fn extend(&mut self, ctx: &CogContext<'_>, channel_id: &str) -> Result<Reply, BotError> {
        let Some(channel) = self.state.live_channel_mut(channel_id) else {
            return Ok(Reply::Ephemeral(GONE_TEXT.to_string()));
        };
        if channel.extend(EXTEND_SECONDS).is_none() {
            warn!("Countdown of {} cannot be extended past {}", channel_id, channel.end_time);
            return Ok(Reply::Ephemeral(EXTEND_LIMIT_TEXT.to_string()));
        }
        let channel = channel.clone();
        self.save().await;

        let icon_url = Self::icon_url(ctx, channel.guild_id.as_deref()).await;
        let embed = countdown_embed(channel.end_time, icon_url, ctx.now);
        if let Err(e) = ctx
            .bot
            .edit_embed(channel_id, &channel.message_id, &embed, Some(countdown_buttons(channel_id)))
            .await
        {
            warn!("Failed to update countdown on extend in {}: {}", channel_id, e);
        }

        info!("Extended auto-delete of {} to {}", channel_id, channel.end_time);
        Ok(Reply::Ephemeral("✅ Extended channel auto-delete by 1 hour.".to_string()))
    }

    async fn dismiss(&mut self, ctx: &CogContext<'_>, channel_id: &str) -> Result<Reply, BotError> {
        let Some(channel) = self.state.live_channel_mut(channel_id) else {
            return Ok(Reply::Ephemeral(GONE_TEXT.to_string()));
        };
        channel.dismissed = true;
        let channel = channel.clone();
        self.save().await;

        let icon_url = Self::icon_url(ctx, channel.guild_id.as_deref()).await;
        let embed = dismissed_embed(channel.end_time, icon_url, ctx.now);
        if let Err(e) = ctx.bot.edit_embed(channel_id, &channel.message_id, &embed, None).await {
            warn!("Failed to update countdown on dismiss in {}: {}", channel_id, e);
        }

        info!("Dismissed auto-delete of {}", channel_id);
        Ok(Reply::Ephemeral("✅ Auto-delete dismissed for this channel.".to_string()))
    }
}

#[async_trait]
impl Cog for SpreeCog {
    fn name(&self) -> &str {
        "spree"
    }

    fn description(&self) -> &str {
        "Temporary channels with an auto-delete countdown"
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::slash("spree_categories_add")
                .with_description("Monitor a category for temporary channels")
                .with_usage("/spree_categories_add category:<id> del_time:<1h30m>"),
            Command::slash("spree_categories_remove")
                .with_description("Stop monitoring a category")
                .with_usage("/spree_categories_remove category:<id>"),
            Command::slash("spree_help").with_description("Explain spree channels"),
            Command::prefix("spree_cat_add")
                .with_description("Monitor a category for temporary channels")
                .with_usage("!spree_cat_add <category> <del_time>")
                .with_permission(Permission::ManageChannels),
            Command::prefix("spree_cat_remove")
                .with_description("Stop monitoring a category")
                .with_usage("!spree_cat_remove <category>")
                .with_permission(Permission::ManageChannels),
        ]
    }

    async fn load(&mut self) -> Result<(), BotError> {
        self.state = match self.store.get(SPREE_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                error!("Failed to parse spree data, starting empty: {}", e);
                SpreeState::default()
            }),
            None => SpreeState::default(),
        };
        info!(
            "Loaded {} spree categories and {} channels",
            self.state.ephemeral_categories.len(),
            self.state.ephemeral_channels.len()
        );
        Ok(())
    }

    async fn on_command(&mut self, ctx: &CogContext<'_>, invocation: &Invocation) -> Result<Reply, BotError> {
        match invocation.name.as_str() {
            "spree_categories_add" | "spree_cat_add" => self.add_category(ctx, invocation).await,
            "spree_categories_remove" | "spree_cat_remove" => self.remove_category(invocation).await,
            "spree_help" => Ok(Reply::EphemeralEmbed(help_embed(&self.prefix))),
            other => Err(CommandError::NotFound(other.to_string()).into()),
        }
    }

    async fn on_channel_create(&mut self, ctx: &CogContext<'_>, channel: &ChannelInfo) -> Result<(), BotError> {
        if channel.kind != ChannelKind::Text {
            return Ok(());
        }
        let Some(seconds) = channel
            .category_id
            .as_ref()
            .and_then(|c| self.state.ephemeral_categories.get(c))
            .copied()
        else {
            return Ok(());
        };

        let Some(record) = SpreeChannel::starting_at(ctx.now, seconds, "") else {
            warn!(
                "Auto-delete of {}s in category of {} is out of range, leaving the channel alone",
                seconds, channel.id
            );
            return Ok(());
        };
        let mut record = record.in_guild(&channel.guild_id);

        let icon_url = Self::icon_url(ctx, record.guild_id.as_deref()).await;
        let embed = countdown_embed(record.end_time, icon_url, ctx.now);
        record.message_id = ctx
            .bot
            .send_embed(&channel.id, &embed, countdown_buttons(&channel.id))
            .await?;

        info!("Channel {} will be deleted at {}", channel.id, record.end_time);
        self.state.ephemeral_channels.insert(channel.id.clone(), record);
        self.save().await;
        Ok(())
    }

    async fn on_button(&mut self, ctx: &CogContext<'_>, press: &ButtonPress) -> Result<Option<Reply>, BotError> {
        let mut parts = press.custom_id.splitn(3, ':');
        if parts.next() != Some(BUTTON_PREFIX) {
            return Ok(None);
        }
        let action = parts.next().unwrap_or_default();
        let channel_id = parts.next().unwrap_or(press.channel_id.as_str());

        let reply = match action {
            "extend" => self.extend(ctx, channel_id).await?,
            "dismiss" => self.dismiss(ctx, channel_id).await?,
            _ => return Ok(None),
        };
        Ok(Some(reply))
    }

    async fn on_tick(&mut self, ctx: &CogContext<'_>) -> Result<(), BotError> {
        let expired = self.state.expired(ctx.now);

        let live: Vec<(String, SpreeChannel)> = self
            .state
            .ephemeral_channels
            .iter()
            .filter(|(id, c)| !c.dismissed && !expired.contains(id))
            .map(|(id, c)| (id.clone(), c.clone()))
            .collect();
        for (channel_id, channel) in live {
            let icon_url = Self::icon_url(ctx, channel.guild_id.as_deref()).await;
            let embed = countdown_embed(channel.end_time, icon_url, ctx.now);
            if let Err(e) = ctx
                .bot
                .edit_embed(&channel_id, &channel.message_id, &embed, Some(countdown_buttons(&channel_id)))
                .await
            {
                warn!("Failed to refresh countdown in {}: {}", channel_id, e);
            }
        }

        if expired.is_empty() {
            return Ok(());
        }
        for channel_id in &expired {
            self.state.ephemeral_channels.remove(channel_id);
            match ctx.bot.delete_channel(channel_id, "Ephemeral channel expired").await {
                Ok(()) => info!("Deleted expired channel {}", channel_id),
                Err(e) => warn!("Failed to delete expired channel {}: {}", channel_id, e),
            }
        }
        self.save().await;
        Ok(())
    }
}
