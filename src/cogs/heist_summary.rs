//! Heist summary cog
//!
//! Reads back recent channel history and lists the latest payouts with
//! links to the announcements.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::application::errors::{BotError, CommandError};
use crate::cogs::trait_def::{Cog, CogContext, Invocation, Reply};
use crate::domain::entities::{Color, Command, Embed};
use crate::domain::payout::{format_abbreviated, scan_for_payouts, DetectedPayout, CURRENCY_GLYPH};

const UNNAMED_HEIST: &str = "Unnamed Heist";
const DEFAULT_EMOJI: &str = "-";
const PREFIX_USAGE: &str = "Usage: `!heist_summary <heists_count> <heist names>`";

/// Split user-supplied names on `/` or `,`, dropping blanks
pub fn split_heist_names(raw: &str) -> Vec<String> {
    raw.split(['/', ','])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// One summary line per detection, oldest first
pub fn summary_lines(payouts: &[DetectedPayout], names: &[String], emoji: &str) -> Vec<String> {
    payouts
        .iter()
        .enumerate()
        .map(|(i, payout)| {
            let name = names.get(i).map(String::as_str).unwrap_or(UNNAMED_HEIST);
            let link = payout.message.permalink().unwrap_or_default();
            format!(
                "{} **[{}]({}) - {} payouts** each got: **{} {}**",
                emoji,
                name,
                link,
                payout.detection.recipient_count,
                CURRENCY_GLYPH,
                format_abbreviated(payout.detection.per_recipient_share)
            )
        })
        .collect()
}

pub struct HeistSummaryCog {
    payout_bot_id: String,
    history_depth: usize,
    max_count: usize,
}

impl HeistSummaryCog {
    pub fn new(payout_bot_id: impl Into<String>, history_depth: usize, max_count: usize) -> Self {
        Self {
            payout_bot_id: payout_bot_id.into(),
            history_depth,
            max_count,
        }
    }

    fn check_count(&self, count: Option<i64>) -> Result<usize, CommandError> {
        match count {
            Some(n) if n >= 1 && n as usize <= self.max_count => Ok(n as usize),
            _ => Err(CommandError::InvalidArgs(format!(
                "heists_count must be between 1 and {}.",
                self.max_count
            ))),
        }
    }

    async fn collect(&self, ctx: &CogContext<'_>, channel_id: &str, count: usize) -> Result<Vec<DetectedPayout>, BotError> {
        let history = ctx.bot.fetch_history(channel_id, self.history_depth).await?;
        let candidates = history
            .iter()
            .filter(|m| m.author.id == self.payout_bot_id)
            .map(|m| m.to_candidate());
        Ok(scan_for_payouts(candidates, count))
    }

    fn not_found(&self) -> String {
        format!("No heist payouts found in the last {} messages.", self.history_depth)
    }

    async fn server_name(ctx: &CogContext<'_>, guild_id: Option<&str>) -> String {
        match guild_id {
            Some(id) => match ctx.bot.guild_info(id).await {
                Ok(guild) => guild.name,
                Err(e) => {
                    warn!("Could not look up guild {}: {}", id, e);
                    "Server".to_string()
                }
            },
            None => "Server".to_string(),
        }
    }

    async fn slash_summary(&self, ctx: &CogContext<'_>, invocation: &Invocation) -> Result<Reply, BotError> {
        let count = self.check_count(invocation.args.int("heists_count", 0)?)?;
        let names = invocation
            .args
            .get("heist_names", 1)
            .ok_or_else(|| CommandError::InvalidArgs("heist_names is required.".to_string()))?;
        let names = split_heist_names(names);
        let emoji = invocation.args.get("emoji", 2).unwrap_or(DEFAULT_EMOJI).to_string();
        let embedded = invocation.args.bool("embedded", 3, false)?;

        let payouts = self.collect(ctx, &invocation.channel_id, count).await?;
        if payouts.is_empty() {
            return Ok(Reply::Ephemeral(self.not_found()));
        }

        let server = Self::server_name(ctx, invocation.guild_id.as_deref()).await;
        let lines = summary_lines(&payouts, &names, &emoji);

        if embedded {
            let embed = Embed::new(format!("{}'s Heist Summary", server))
                .with_description(lines.join("\n"))
                .with_color(Color::BLURPLE)
                .with_footer("Use /heist_summary.", None);
            ctx.bot.send_embed(&invocation.channel_id, &embed, Vec::new()).await?;
        } else {
            let text = format!("**{}'s Heist Summary**\n{}", server, lines.join("\n"));
            ctx.bot.send_message(&invocation.channel_id, &text).await?;
        }

        info!("Posted summary of {} heists in {}", payouts.len(), invocation.channel_id);
        Ok(Reply::Ephemeral("Heist summary posted successfully!".to_string()))
    }

    /// The request message is removed once its arguments are accepted
    async fn prefix_summary(&self, ctx: &CogContext<'_>, invocation: &Invocation) -> Result<Reply, BotError> {
        let count = self.check_count(invocation.args.int("heists_count", 0)?)?;
        let names = invocation
            .args
            .rest(1)
            .ok_or_else(|| CommandError::InvalidArgs(PREFIX_USAGE.to_string()))?;
        let names = split_heist_names(&names);

        if let Some(message_id) = &invocation.message_id {
            if let Err(e) = ctx.bot.delete_message(&invocation.channel_id, message_id).await {
                warn!("Could not delete summary request {}: {}", message_id, e);
            }
        }

        let payouts = self.collect(ctx, &invocation.channel_id, count).await?;
        if payouts.is_empty() {
            return Ok(Reply::Public(self.not_found()));
        }

        let server = Self::server_name(ctx, invocation.guild_id.as_deref()).await;
        let lines = summary_lines(&payouts, &names, DEFAULT_EMOJI);
        let text = format!("**{}'s Heist Summary**\n{}", server, lines.join("\n"));
        ctx.bot.send_message(&invocation.channel_id, &text).await?;

        info!("Posted summary of {} heists in {}", payouts.len(), invocation.channel_id);
        Ok(Reply::None)
    }
}

#[async_trait]
impl Cog for HeistSummaryCog {
    fn name(&self) -> &str {
        "heist_summary"
    }

    fn description(&self) -> &str {
        "Summarises recent heist payouts"
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::slash("heist_summary")
                .with_description("Summarise the latest heist payouts in this channel")
                .with_usage("/heist_summary heists_count:<1-5> heist_names:<a/b> [emoji] [embedded]"),
            Command::prefix("heist_summary")
                .with_description("Summarise the latest heist payouts in this channel")
                .with_usage("!heist_summary <count> <names...>"),
        ]
    }

    async fn on_command(&mut self, ctx: &CogContext<'_>, invocation: &Invocation) -> Result<Reply, BotError> {
        if invocation.is_slash() {
            self.slash_summary(ctx, invocation).await
        } else {
            self.prefix_summary(ctx, invocation).await
        }
    }
}
