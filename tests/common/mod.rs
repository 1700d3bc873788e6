//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Once};

use heist_bot::application::errors::BotError;
use heist_bot::domain::entities::{GuildInfo, Message, User};
use heist_bot::domain::traits::Store;
use heist_bot::infrastructure::adapters::console::ConsoleAdapter;
use heist_bot::infrastructure::icons::{IconProvider, IconSource};
use heist_bot::infrastructure::render::encode_png;
use heist_bot::infrastructure::storage::JsonStore;

pub const PAYOUT_BOT: &str = "270904126974590976";
pub const GUILD: &str = "1";
pub const CHANNEL: &str = "10";
pub const ICON_RGB: [u8; 3] = [200, 100, 50];

static INIT: Once = Once::new();

/// Route `tracing` output through the test harness; `RUST_LOG` picks the level
pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn announcement(total: &str, count: &str) -> String {
    format!(
        "Amazing job everybody!\nThe crew **racked up a total of** `⏣ {}`\n**{}** users got the payout",
        total, count
    )
}

pub fn payout_message(id: &str, text: &str) -> Message {
    Message::new(id, CHANNEL, User::new(PAYOUT_BOT).as_bot())
        .with_guild(GUILD)
        .with_content(text)
}

pub fn member_message(id: &str, text: &str) -> Message {
    Message::new(id, CHANNEL, User::new("42"))
        .with_guild(GUILD)
        .with_content(text)
}

pub fn admin() -> User {
    User::new("7").with_username("admin").as_admin()
}

pub fn member() -> User {
    User::new("42").with_username("member")
}

pub fn console() -> ConsoleAdapter {
    ensure_init();
    ConsoleAdapter::new().with_guild(GuildInfo::new(GUILD, "Heisters").with_icon("https://cdn/icon.png"))
}

pub struct TempStore {
    pub dir: PathBuf,
    pub store: Arc<dyn Store>,
}

impl TempStore {
    pub async fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("heist-bot-it-{}", uuid::Uuid::new_v4()));
        Self::at(dir).await
    }

    /// A second store over the same directory, with a cold cache
    pub fn reopen(&self) -> Arc<dyn Store> {
        Arc::new(JsonStore::new(&self.dir))
    }

    async fn at(dir: PathBuf) -> Self {
        let store = JsonStore::new(&dir);
        store.init().await.unwrap();
        Self {
            dir,
            store: Arc::new(store),
        }
    }

    pub fn read(&self, key: &str) -> String {
        std::fs::read_to_string(self.dir.join(format!("{}.json", key))).unwrap()
    }
}

impl Drop for TempStore {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

/// Serves the same solid-colour PNG for every url
pub struct StaticIcon;

#[async_trait]
impl IconSource for StaticIcon {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, BotError> {
        encode_png(image::RgbImage::from_pixel(64, 64, image::Rgb(ICON_RGB)))
    }
}

pub fn icons() -> IconProvider {
    IconProvider::new(Box::new(StaticIcon), 600)
}
