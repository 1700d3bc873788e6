//! Heist calculator flows through the dispatcher and console adapter
//! Run with: cargo test --test heist_calculator_test

mod common;

use chrono::Utc;
use std::sync::Arc;

use common::*;
use heist_bot::application::messaging::{Event, EventDispatcher};
use heist_bot::cogs::{CogManager, HeistCalculatorCog};
use heist_bot::domain::entities::{HeistSettings, Template, User};
use heist_bot::domain::traits::Store;
use heist_bot::infrastructure::adapters::console::{ConsoleAdapter, Outbound};
use heist_bot::infrastructure::render::CardRenderer;

async fn setup(store: Arc<dyn Store>) -> EventDispatcher {
    setup_with(store, CardRenderer::without_font()).await
}

async fn setup_with(store: Arc<dyn Store>, renderer: CardRenderer) -> EventDispatcher {
    let mut cogs = CogManager::new();
    cogs.register(HeistCalculatorCog::new(PAYOUT_BOT, store, icons(), renderer, 100))
        .unwrap();
    cogs.load_all().await.unwrap();
    EventDispatcher::new("!", cogs)
}

/// Renderer backed by a system font, when the machine has one
fn system_renderer() -> Option<CardRenderer> {
    let renderer = CardRenderer::discover(None);
    if renderer.has_font() {
        Some(renderer)
    } else {
        eprintln!("no system font available, skipping image reply check");
        None
    }
}

fn slash(text: &str, user: User) -> Event {
    Event::SlashCommand {
        text: text.to_string(),
        user,
        guild_id: Some(GUILD.to_string()),
        channel_id: CHANNEL.to_string(),
    }
}

async fn send(dispatcher: &mut EventDispatcher, bot: &ConsoleAdapter, event: Event) {
    dispatcher.dispatch(bot, event, Utc::now()).await.unwrap();
}

#[tokio::test]
async fn test_disabled_channel_is_silent() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;

    let message = payout_message("100", &announcement("1,000,000", "4"));
    send(&mut dispatcher, &bot, Event::MessageCreated(message)).await;

    assert!(bot.sent().is_empty());
}

#[tokio::test]
async fn test_text_reply_once_per_message() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;

    send(&mut dispatcher, &bot, slash("/heist_calculate", admin())).await;
    let sent = bot.take_sent();
    assert!(matches!(
        &sent[..],
        [Outbound::Ephemeral { text, .. }]
            if text == "Heist Calculator is now **enabled** for **this channel (<#10>)** using **text** template."
    ));

    let message = payout_message("100", &announcement("1,000,000", "4"));
    send(&mut dispatcher, &bot, Event::MessageCreated(message.clone())).await;
    send(&mut dispatcher, &bot, Event::MessageCreated(message)).await;

    let sent = bot.take_sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Outbound::ReplyEmbed { reply_to, embed, .. } => {
            assert_eq!(reply_to, "100");
            assert_eq!(embed.title.as_deref(), Some("Heist Payouts"));
            assert_eq!(
                embed.description.as_deref(),
                Some("4 Person Got: ⏣ 250,000 **(250K)**")
            );
            assert_eq!(
                embed.footer.as_ref().map(|f| f.text.as_str()),
                Some("Toggle with /heist_calculate or !heist_cal toggle")
            );
        }
        other => panic!("unexpected outbound: {:?}", other),
    }
}

#[tokio::test]
async fn test_ignores_other_authors_and_non_payouts() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;
    send(&mut dispatcher, &bot, slash("/heist_calculate full_server:true", admin())).await;
    bot.take_sent();

    let forged = member_message("200", &announcement("1,000,000", "4"));
    send(&mut dispatcher, &bot, Event::MessageCreated(forged)).await;

    let chatter = payout_message("201", "Amazing job everybody! Better luck next time.");
    send(&mut dispatcher, &bot, Event::MessageCreated(chatter)).await;

    assert!(bot.sent().is_empty());
}

#[tokio::test]
async fn test_image_template_sends_png() {
    let Some(renderer) = system_renderer() else {
        return;
    };
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup_with(store.store.clone(), renderer).await;
    send(&mut dispatcher, &bot, slash("/heist_calculate template:image", admin())).await;
    bot.take_sent();

    let message = payout_message("300", &announcement("3m", "2"));
    send(&mut dispatcher, &bot, Event::MessageCreated(message)).await;

    let sent = bot.take_sent();
    match &sent[..] {
        [Outbound::ReplyImage { reply_to, file_name, png, .. }] => {
            assert_eq!(reply_to, "300");
            assert_eq!(file_name, "heist_payout.png");

            let card = image::load_from_memory(png).unwrap().to_rgb8();
            assert_eq!(card.dimensions(), (256, 256));
            // Guild icon on top, faded to near black along the bottom edge.
            let top = card.get_pixel(128, 10).0;
            assert!(top.iter().zip(ICON_RGB).all(|(&got, want)| got.abs_diff(want) <= 1));
            let bottom = card.get_pixel(2, 250).0;
            assert!(bottom.iter().all(|&c| c < 50), "bottom row not darkened: {:?}", bottom);
        }
        other => panic!("unexpected outbound: {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_failure_falls_back_to_embed() {
    let Some(renderer) = system_renderer() else {
        return;
    };
    let store = TempStore::new().await;
    let bot = console().with_upload_failure();
    let mut dispatcher = setup_with(store.store.clone(), renderer).await;
    send(&mut dispatcher, &bot, slash("/heist_calculate template:image", admin())).await;
    bot.take_sent();

    let message = payout_message("400", &announcement("3m", "2"));
    send(&mut dispatcher, &bot, Event::MessageCreated(message)).await;

    let sent = bot.take_sent();
    assert!(matches!(
        &sent[..],
        [Outbound::ReplyEmbed { embed, .. }]
            if embed.description.as_deref() == Some("2 Person Got: ⏣ 1,500,000 **(1.5M)**")
    ));
}

#[tokio::test]
async fn test_missing_font_falls_back_to_embed() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;
    send(&mut dispatcher, &bot, slash("/heist_calculate template:image", admin())).await;
    bot.take_sent();

    let message = payout_message("500", &announcement("1,000", "4"));
    send(&mut dispatcher, &bot, Event::MessageCreated(message)).await;

    let sent = bot.take_sent();
    assert!(matches!(
        &sent[..],
        [Outbound::ReplyEmbed { reply_to, embed, .. }]
            if reply_to == "500" && embed.description.as_deref() == Some("4 Person Got: ⏣ 250 **(250)**")
    ));
}

#[tokio::test]
async fn test_permissions() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;

    send(&mut dispatcher, &bot, slash("/heist_calculate", member())).await;
    send(
        &mut dispatcher,
        &bot,
        Event::MessageCreated(member_message("1", "!heist_cal toggle true")),
    )
    .await;
    send(&mut dispatcher, &bot, Event::MessageCreated(member_message("2", "!heist_cal"))).await;

    let texts: Vec<String> = bot
        .take_sent()
        .into_iter()
        .map(|o| match o {
            Outbound::Ephemeral { text, .. } | Outbound::Text { text, .. } => text,
            other => panic!("unexpected outbound: {:?}", other),
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            "Admin permissions required.",
            "Admin perms required.",
            "Use `!heist_cal help` for commands.",
        ]
    );
}

#[tokio::test]
async fn test_settings_persist_and_reload() {
    let store = TempStore::new().await;
    let bot = console();
    let mut dispatcher = setup(store.store.clone()).await;

    let admin_message = |id: &str, text: &str| {
        let mut message = member_message(id, text);
        message.author = admin();
        Event::MessageCreated(message)
    };

    send(&mut dispatcher, &bot, admin_message("1", "!heist_cal toggle true image")).await;
    send(&mut dispatcher, &bot, admin_message("2", "!heist_cal global true")).await;

    let saved: HeistSettings = serde_json::from_str(&store.read("heist_calc_config")).unwrap();
    assert!(saved.is_enabled(GUILD, "999"));
    assert_eq!(saved.template(GUILD), Template::Image);
    assert!(store.read("heist_calc_config").contains("\"10\": true"));

    // Edit the document behind the bot's back, then reload.
    std::fs::write(store.dir.join("heist_calc_config.json"), "{}").unwrap();
    send(&mut dispatcher, &bot, admin_message("3", "!heist_cal reload")).await;

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
            "Heist Calculator is now **enabled** in <#10> with `image` template.",
            "Global Heist Calculator is now **enabled** for this server.",
            "Heist Calculator configuration reloaded.",
        ]
    );

    let message = payout_message("500", &announcement("1,000", "2"));
    send(&mut dispatcher, &bot, Event::MessageCreated(message)).await;
    assert!(bot.sent().is_empty());

    // A fresh process reads the same file.
    let mut restarted = setup(store.reopen()).await;
    send(&mut restarted, &bot, slash("/heist_calculate enable:false", admin())).await;
    assert!(store.read("heist_calc_config").contains("\"10\": false"));
}
