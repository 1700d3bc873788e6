//! Heist calculator cog
//!
//! Replies to every payout announcement in an enabled channel with the
//! per-recipient share, either as an embed or as an image card.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::errors::{BotError, CommandError};
use crate::cogs::trait_def::{Cog, CogContext, Invocation, Reply};
use crate::domain::card::PayoutCard;
use crate::domain::entities::{Color, Command, Embed, HeistSettings, Message, Permission, Template, User};
use crate::domain::payout::{detect_payout, format_abbreviated, format_grouped, PayoutDetection, CURRENCY_GLYPH};
use crate::domain::traits::Store;
use crate::infrastructure::icons::IconProvider;
use crate::infrastructure::render::{CardRenderer, CARD_FILE_NAME};

/// Store key of the per-guild settings document
pub const SETTINGS_KEY: &str = "heist_calc_config";

const EMBED_COLOR: Color = Color::from_rgb(114, 137, 218);

const HELP_TEXT: &str = "**Heist Calculator commands**\n\
`!heist_cal toggle <true|false> [text|image]` - enable or disable in this channel\n\
`!heist_cal global <true|false>` - enable or disable for the whole server\n\
`!heist_cal reload` - reload settings from disk\n\
`!heist_cal refresh_icon` - fetch the server icon again\n\
`/heist_calculate` - slash version of toggle and global";

/// Remembers the most recent message ids, oldest evicted first
#[derive(Debug)]
struct ProcessedSet {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl ProcessedSet {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// False when `id` was already recorded
    fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(id.to_string());
        self.seen.insert(id.to_string());
        true
    }
}

pub struct HeistCalculatorCog {
    payout_bot_id: String,
    store: Arc<dyn Store>,
    settings: HeistSettings,
    processed: ProcessedSet,
    icons: IconProvider,
    renderer: CardRenderer,
}

impl HeistCalculatorCog {
    pub fn new(
        payout_bot_id: impl Into<String>,
        store: Arc<dyn Store>,
        icons: IconProvider,
        renderer: CardRenderer,
        processed_capacity: usize,
    ) -> Self {
        Self {
            payout_bot_id: payout_bot_id.into(),
            store,
            settings: HeistSettings::new(),
            processed: ProcessedSet::new(processed_capacity),
            icons,
            renderer,
        }
    }

    pub fn settings(&self) -> &HeistSettings {
        &self.settings
    }

    async fn read_settings(&mut self, fresh: bool) -> Result<(), BotError> {
        let raw = if fresh {
            self.store.reload(SETTINGS_KEY).await?
        } else {
            self.store.get(SETTINGS_KEY).await?
        };

        self.settings = match raw {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                error!("Failed to parse heist calculator settings, starting empty: {}", e);
                HeistSettings::new()
            }),
            None => HeistSettings::new(),
        };
        Ok(())
    }

    async fn save(&self) {
        let result = match serde_json::to_string_pretty(&self.settings) {
            Ok(raw) => self.store.set(SETTINGS_KEY, &raw).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            error!("Failed to save heist calculator settings: {}", e);
        }
    }

    async fn reply_to_payout(
        &mut self,
        ctx: &CogContext<'_>,
        message: &Message,
        guild_id: &str,
        detection: &PayoutDetection,
    ) -> Result<(), BotError> {
        let embed = payout_embed(detection);

        if self.settings.template(guild_id) == Template::Image {
            let icon_url = match ctx.bot.guild_info(guild_id).await {
                Ok(guild) => guild.icon_url,
                Err(e) => {
                    warn!("Could not look up guild {}: {}", guild_id, e);
                    None
                }
            };
            let icon = self.icons.icon_for(guild_id, icon_url.as_deref(), ctx.now).await;
            let card = PayoutCard::new(
                detection.recipient_count,
                detection.per_recipient_share,
                icon,
                &self.renderer,
            );

            match self.renderer.render(&card) {
                Ok(png) => match ctx.bot.reply_image(&message.channel_id, &message.id, CARD_FILE_NAME, &png).await {
                    Ok(_) => {
                        info!("Sent image payout reply for message {}", message.id);
                        return Ok(());
                    }
                    Err(e) => error!("Image reply failed for message {}, sending embed: {}", message.id, e),
                },
                Err(e) => error!("Could not render payout card for message {}, sending embed: {}", message.id, e),
            }
        }

        ctx.bot.reply_embed(&message.channel_id, &message.id, &embed).await?;
        info!("Sent text payout reply for message {}", message.id);
        Ok(())
    }

    async fn slash_calculate(&mut self, invocation: &Invocation, guild_id: &str) -> Result<Reply, BotError> {
        let enable = invocation.args.bool("enable", 0, true)?;
        let full_server = invocation.args.bool("full_server", 1, false)?;
        let template = match invocation.args.get("template", 2) {
            Some(raw) => Template::parse(raw).ok_or_else(|| {
                CommandError::InvalidArgs("Invalid template. Choose 'text' or 'image'.".to_string())
            })?,
            None => Template::Text,
        };

        let guild = self.settings.guild_mut(guild_id);
        if full_server {
            guild.global = enable;
        } else {
            guild.set_channel(&invocation.channel_id, enable);
        }
        guild.template = template;
        self.save().await;

        let scope = if full_server {
            "the entire server".to_string()
        } else {
            format!("this channel (<#{}>)", invocation.channel_id)
        };
        Ok(Reply::Ephemeral(format!(
            "Heist Calculator is now **{}** for **{}** using **{}** template.",
            state_word(enable),
            scope,
            template
        )))
    }

    async fn prefix_cal(
        &mut self,
        ctx: &CogContext<'_>,
        invocation: &Invocation,
        guild_id: &str,
    ) -> Result<Reply, BotError> {
        let Some(sub) = invocation.args.get("subcommand", 0).map(str::to_lowercase) else {
            return Ok(Reply::Public("Use `!heist_cal help` for commands.".to_string()));
        };

        if sub == "help" {
            return Ok(Reply::Public(HELP_TEXT.to_string()));
        }
        require_admin(&invocation.invoker)?;

        match sub.as_str() {
            "toggle" => {
                let enable = invocation.args.bool("enable", 1, true)?;
                let template = match invocation.args.get("template", 2) {
                    Some(raw) => Template::parse(&raw.to_lowercase()).ok_or_else(|| {
                        CommandError::InvalidArgs("Template must be 'text' or 'image'.".to_string())
                    })?,
                    None => Template::Text,
                };
                let guild = self.settings.guild_mut(guild_id);
                guild.set_channel(&invocation.channel_id, enable);
                guild.template = template;
                self.save().await;
                Ok(Reply::Public(format!(
                    "Heist Calculator is now **{}** in <#{}> with `{}` template.",
                    state_word(enable),
                    invocation.channel_id,
                    template
                )))
            }
            "global" => {
                let enable = invocation.args.bool("enable", 1, true)?;
                self.settings.guild_mut(guild_id).global = enable;
                self.save().await;
                Ok(Reply::Public(format!(
                    "Global Heist Calculator is now **{}** for this server.",
                    state_word(enable)
                )))
            }
            "reload" => {
                self.read_settings(true).await?;
                info!("Reloaded heist calculator settings");
                Ok(Reply::Public("Heist Calculator configuration reloaded.".to_string()))
            }
            "refresh_icon" => {
                let icon_url = ctx.bot.guild_info(guild_id).await.ok().and_then(|g| g.icon_url);
                self.icons.refresh(guild_id, icon_url.as_deref(), ctx.now).await;
                Ok(Reply::Public("Server icon cache refreshed.".to_string()))
            }
            other => Err(CommandError::InvalidArgs(format!(
                "Unknown subcommand `{}`. Use `!heist_cal help` for commands.",
                other
            ))
            .into()),
        }
    }
}

fn state_word(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

fn require_admin(user: &User) -> Result<(), CommandError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(CommandError::PermissionDenied("Admin perms required.".to_string()))
    }
}

/// Text reply for one detection
pub fn payout_embed(detection: &PayoutDetection) -> Embed {
    let share = detection.per_recipient_share;
    Embed::new("Heist Payouts")
        .with_color(EMBED_COLOR)
        .with_description(format!(
            "{} Person Got: {} {} **({})**",
            detection.recipient_count,
            CURRENCY_GLYPH,
            format_grouped(share),
            format_abbreviated(share)
        ))
        .with_footer("Toggle with /heist_calculate or !heist_cal toggle", None)
}

#[async_trait]
impl Cog for HeistCalculatorCog {
    fn name(&self) -> &str {
        "heist_calculator"
    }

    fn description(&self) -> &str {
        "Splits heist payouts per recipient"
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::slash("heist_calculate")
                .with_description("Enable or disable the heist calculator")
                .with_usage("/heist_calculate [enable] [full_server] [template]")
                .with_permission(Permission::Administrator),
            Command::prefix("heist_cal")
                .with_description("Heist calculator settings")
                .with_usage("!heist_cal <help|toggle|global|reload|refresh_icon>"),
        ]
    }

    async fn load(&mut self) -> Result<(), BotError> {
        self.read_settings(false).await
    }

    async fn on_command(&mut self, ctx: &CogContext<'_>, invocation: &Invocation) -> Result<Reply, BotError> {
        let guild_id = invocation
            .guild_id
            .clone()
            .ok_or_else(|| CommandError::Rejected("This command can only be used in a server.".to_string()))?;

        match invocation.name.as_str() {
            "heist_calculate" => self.slash_calculate(invocation, &guild_id).await,
            "heist_cal" => self.prefix_cal(ctx, invocation, &guild_id).await,
            other => Err(CommandError::NotFound(other.to_string()).into()),
        }
    }

    async fn on_message(&mut self, ctx: &CogContext<'_>, message: &Message) -> Result<(), BotError> {
        if !self.processed.insert(&message.id) {
            return Ok(());
        }
        let Some(guild_id) = message.guild_id.as_deref() else {
            return Ok(());
        };
        if message.author.id != self.payout_bot_id {
            return Ok(());
        }
        if !self.settings.is_enabled(guild_id, &message.channel_id) {
            return Ok(());
        }

        let Some(detection) = detect_payout(&message.combined_text()) else {
            debug!("Message {} is not a payout announcement", message.id);
            return Ok(());
        };

        info!(
            "Payout detected in message {}: {} users, {} each",
            message.id, detection.recipient_count, detection.per_recipient_share
        );
        self.reply_to_payout(ctx, message, guild_id, &detection).await
    }

    async fn on_tick(&mut self, ctx: &CogContext<'_>) -> Result<(), BotError> {
        let evicted = self.icons.evict_expired(ctx.now);
        if evicted > 0 {
            debug!("Evicted {} cached guild icons", evicted);
        }
        Ok(())
    }
}
