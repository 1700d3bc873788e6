//! Spree channel lifecycle: monitor, create, extend, dismiss, expire
//! Run with: cargo test --test spree_test

mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use common::*;
use heist_bot::application::messaging::{Event, EventDispatcher};
use heist_bot::cogs::{ButtonPress, CogManager, SpreeCog};
use heist_bot::domain::entities::{ChannelInfo, Color, SpreeState, User};
use heist_bot::domain::traits::{ButtonStyle, Store};
use heist_bot::infrastructure::adapters::console::{ConsoleAdapter, Outbound};

const CATEGORY: &str = "77";
const TEMP_CHANNEL: &str = "55";

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

async fn setup(store: Arc<dyn Store>) -> EventDispatcher {
    let mut cogs = CogManager::new();
    cogs.register(SpreeCog::new(store, "!")).unwrap();
    cogs.load_all().await.unwrap();
    EventDispatcher::new("!", cogs)
}

fn slash(text: &str, user: User) -> Event {
    Event::SlashCommand {
        text: text.to_string(),
        user,
        guild_id: Some(GUILD.to_string()),
        channel_id: CHANNEL.to_string(),
    }
}

fn press(action: &str) -> Event {
    Event::ButtonPressed(ButtonPress {
        custom_id: format!("spree:{}:{}", action, TEMP_CHANNEL),
        channel_id: TEMP_CHANNEL.to_string(),
        guild_id: Some(GUILD.to_string()),
        user: member(),
    })
}

fn created() -> Event {
    Event::ChannelCreated(ChannelInfo::text(TEMP_CHANNEL, GUILD, "spree-1").in_category(CATEGORY))
}

fn ephemeral_texts(bot: &ConsoleAdapter) -> Vec<String> {
    bot.take_sent()
        .into_iter()
        .filter_map(|o| match o {
            Outbound::Ephemeral { text, .. } => Some(text),
            _ => None,
        })
        .collect()
}

/// Monitored category plus one temporary channel created at `start()`
async fn with_temp_channel(store: &TempStore, bot: &ConsoleAdapter) -> EventDispatcher {
    let mut dispatcher = setup(store.store.clone()).await;
    dispatcher
        .dispatch(bot, slash("/spree_categories_add category:77 del_time:1h", admin()), start())
        .await
        .unwrap();
    dispatcher.dispatch(bot, created(), start()).await.unwrap();
    dispatcher
}

#[tokio::test]
async fn test_monitor_and_announce() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;

    dispatcher
        .dispatch(&bot, slash("/spree_categories_add category:<#77> del_time:1h", admin()), start())
        .await
        .unwrap();
    assert_eq!(
        ephemeral_texts(&bot),
        vec!["✅ Category **<#77>** is now monitored. Default auto-delete: 1h."]
    );

    // Channels outside the category and non-text channels are left alone.
    dispatcher
        .dispatch(&bot, Event::ChannelCreated(ChannelInfo::text("56", GUILD, "general")), start())
        .await
        .unwrap();
    assert!(bot.sent().is_empty());

    dispatcher.dispatch(&bot, created(), start()).await.unwrap();
    let sent = bot.take_sent();
    match &sent[..] {
        [Outbound::Embed { channel_id, embed, buttons, .. }] => {
            assert_eq!(channel_id, TEMP_CHANNEL);
            assert_eq!(embed.title.as_deref(), Some("⏰ Temporary Channel"));
            assert_eq!(embed.timestamp, Some(start()));
            let deadline = (start() + Duration::hours(1)).timestamp();
            assert_eq!(
                embed.description,
                Some(format!("This channel will be deleted <t:{}:R>.", deadline))
            );
            assert_eq!(
                embed.footer.as_ref().and_then(|f| f.icon_url.as_deref()),
                Some("https://cdn/icon.png")
            );
            assert_eq!(buttons.len(), 2);
            assert_eq!(buttons[0].label, "Extend 1h");
            assert_eq!(buttons[0].style, ButtonStyle::Success);
            assert_eq!(buttons[1].label, "Dismiss");
        }
        other => panic!("unexpected outbound: {:?}", other),
    }

    let state: SpreeState = serde_json::from_str(&store.read("spree_data")).unwrap();
    assert_eq!(state.ephemeral_categories.get(CATEGORY), Some(&3_600));
    let channel = &state.ephemeral_channels[TEMP_CHANNEL];
    assert_eq!(channel.end_time, start() + Duration::hours(1));
    assert!(!channel.dismissed);
}

#[tokio::test]
async fn test_extend_then_dismiss() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = with_temp_channel(&store, &bot).await;
    bot.take_sent();

    dispatcher.dispatch(&bot, press("extend"), start()).await.unwrap();
    let sent = bot.take_sent();
    let deadline = (start() + Duration::hours(2)).timestamp();
    assert!(sent.iter().any(|o| matches!(
        o,
        Outbound::Edit { embed, buttons: Some(_), .. }
            if embed.description == Some(format!("This channel will be deleted <t:{}:R>.", deadline))
    )));
    assert!(sent.iter().any(|o| matches!(
        o,
        Outbound::Ephemeral { text, .. } if text == "✅ Extended channel auto-delete by 1 hour."
    )));

    dispatcher.dispatch(&bot, press("dismiss"), start()).await.unwrap();
    let sent = bot.take_sent();
    assert!(sent.iter().any(|o| matches!(
        o,
        Outbound::Edit { embed, buttons: None, .. }
            if embed.color == Some(Color::RED)
                && embed.description.as_deref().is_some_and(|d| d.ends_with("**This channel will NOT be deleted**"))
    )));
    assert!(sent.iter().any(|o| matches!(
        o,
        Outbound::Ephemeral { text, .. } if text == "✅ Auto-delete dismissed for this channel."
    )));

    dispatcher.dispatch(&bot, press("extend"), start()).await.unwrap();
    dispatcher.dispatch(&bot, press("dismiss"), start()).await.unwrap();
    assert_eq!(
        ephemeral_texts(&bot),
        vec![
            "Auto-delete is already dismissed or ended.",
            "Auto-delete is already dismissed or ended.",
        ]
    );

    // Dismissed channels survive their deadline.
    dispatcher.dispatch(&bot, Event::Tick, start() + Duration::days(1)).await.unwrap();
    assert!(!bot
        .take_sent()
        .iter()
        .any(|o| matches!(o, Outbound::DeleteChannel { .. })));
}

#[tokio::test]
async fn test_tick_refreshes_then_deletes() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = with_temp_channel(&store, &bot).await;
    bot.take_sent();

    dispatcher
        .dispatch(&bot, Event::Tick, start() + Duration::minutes(30))
        .await
        .unwrap();
    let sent = bot.take_sent();
    assert!(matches!(&sent[..], [Outbound::Edit { buttons: Some(_), .. }]));

    dispatcher
        .dispatch(&bot, Event::Tick, start() + Duration::seconds(3_600))
        .await
        .unwrap();
    let sent = bot.take_sent();
    assert!(matches!(
        &sent[..],
        [Outbound::DeleteChannel { channel_id, .. }] if channel_id == TEMP_CHANNEL
    ));

    let state: SpreeState = serde_json::from_str(&store.read("spree_data")).unwrap();
    assert!(state.ephemeral_channels.is_empty());
    assert_eq!(state.ephemeral_categories.len(), 1);
}

#[tokio::test]
async fn test_command_errors_and_permissions() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;

    for (text, user) in [
        ("/spree_categories_add category:77 del_time:soon", admin()),
        ("/spree_categories_add category:77 del_time:1h", member()),
        ("/spree_categories_remove category:77", member()),
        ("/spree_categories_remove category:77", admin()),
    ] {
        dispatcher.dispatch(&bot, slash(text, user), start()).await.unwrap();
    }

    assert_eq!(
        ephemeral_texts(&bot),
        vec![
            "❌ Invalid time format. Use '10s', '5m', '1h30m', '2d', etc.",
            "✅ Category **<#77>** is now monitored. Default auto-delete: 1h.",
            "✅ Category **<#77>** is no longer monitored.",
            "❌ Category **<#77>** was not monitored.",
        ]
    );

    // The prefix aliases stay behind Manage Channels.
    dispatcher
        .dispatch(&bot, Event::MessageCreated(member_message("1", "!spree_cat_add 77 1h")), start())
        .await
        .unwrap();
    assert!(matches!(
        &bot.take_sent()[..],
        [Outbound::Text { text, .. }] if text == "You need the Manage Channels permission to use this command."
    ));
}

#[tokio::test]
async fn test_out_of_range_countdowns() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;

    dispatcher
        .dispatch(&bot, slash("/spree_categories_add category:77 del_time:100000000d", admin()), start())
        .await
        .unwrap();
    assert_eq!(
        ephemeral_texts(&bot),
        vec!["❌ Invalid time format. Use '10s', '5m', '1h30m', '2d', etc."]
    );
    dispatcher.dispatch(&bot, created(), start()).await.unwrap();
    assert!(bot.sent().is_empty());

    // A countdown saved by an older build is skipped instead of taking the bot down.
    std::fs::write(
        store.dir.join("spree_data.json"),
        r#"{ "ephemeral_categories": { "77": 18446744073709551615 } }"#,
    )
    .unwrap();
    let mut restarted = setup(store.reopen()).await;
    restarted.dispatch(&bot, created(), start()).await.unwrap();
    restarted.dispatch(&bot, Event::Tick, start()).await.unwrap();
    assert!(bot.sent().is_empty());
    assert!(restarted.cogs().has_cog("spree"));
}

#[tokio::test]
async fn test_prefix_commands_and_restart() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;
    let manager = User::new("8").with_manage_channels();

    let mut add = member_message("1", "!spree_cat_add <#77> 1h 30m");
    add.author = manager.clone();
    dispatcher.dispatch(&bot, Event::MessageCreated(add), start()).await.unwrap();

    let mut add_other = member_message("2", "!spree_cat_add 78 2d");
    add_other.author = manager.clone();
    dispatcher.dispatch(&bot, Event::MessageCreated(add_other), start()).await.unwrap();

    let mut remove = member_message("3", "!spree_cat_remove 78");
    remove.author = manager;
    dispatcher.dispatch(&bot, Event::MessageCreated(remove), start()).await.unwrap();

    let texts: Vec<String> = bot
        .take_sent()
        .into_iter()
        .filter_map(|o| match o {
            Outbound::Text { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            "✅ Category **<#77>** is now ephemeral with default time 1h 30m.",
            "✅ Category **<#78>** is now ephemeral with default time 2d.",
            "✅ Category **<#78>** is no longer ephemeral.",
        ]
    );

    // A restarted bot picks the category up from disk.
    let mut restarted = setup(store.reopen()).await;
    restarted.dispatch(&bot, created(), start()).await.unwrap();
    let sent = bot.take_sent();
    let deadline = (start() + Duration::seconds(5_400)).timestamp();
    assert!(matches!(
        &sent[..],
        [Outbound::Embed { embed, .. }]
            if embed.description == Some(format!("This channel will be deleted <t:{}:R>.", deadline))
    ));
}

#[tokio::test]
async fn test_help() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;

    dispatcher
        .dispatch(&bot, slash("/spree_help", member()), start())
        .await
        .unwrap();

    let sent = bot.take_sent();
    assert!(matches!(
        &sent[..],
        [Outbound::Ephemeral { embed: Some(embed), .. }]
            if embed.title.as_deref() == Some("Spree Channels Help")
                && embed.footer.as_ref().map(|f| f.text.as_str()) == Some("Spree ephemeral channels system")
    ));
}
