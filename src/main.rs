use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use heist_bot::application::errors::BotError;
use heist_bot::application::messaging::{Event, EventDispatcher};
use heist_bot::cogs::{CogManager, HeistCalculatorCog, HeistSummaryCog, SpreeCog};
use heist_bot::domain::duration::parse_time_string;
use heist_bot::domain::entities::{GuildInfo, Message};
use heist_bot::domain::payout::{format_abbreviated, format_grouped, scan_for_payouts, CURRENCY_GLYPH};
use heist_bot::domain::traits::{Bot, Store};
use heist_bot::infrastructure::adapters::console::{ConsoleAdapter, ConsoleSession};
use heist_bot::infrastructure::config::Config;
use heist_bot::infrastructure::icons::{HttpIconSource, IconProvider};
use heist_bot::infrastructure::render::CardRenderer;
use heist_bot::infrastructure::storage::JsonStore;

const CONSOLE_GUILD: &str = "1";
const CONSOLE_CHANNEL: &str = "10";

#[derive(Parser)]
#[command(name = "heist-bot")]
#[command(about = "Heist payout calculator, summaries and temporary channels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console
    Run {
        /// JSON array of messages (newest first) to seed the channel history
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// List the payouts found in a JSON array of messages (newest first)
    Scan {
        file: PathBuf,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// Convert a duration such as 1h30m to seconds
    ParseTime { value: String },
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { history } => {
            run_bot(cli.config, history);
        }
        Commands::Scan { file, limit } => {
            if let Err(e) = scan_file(&file, limit) {
                tracing::error!("Scan failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::ParseTime { value } => match parse_time_string(&value) {
            Ok(seconds) => println!("{}", seconds),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        Commands::Version => {
            println!("heist-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn load_config(config_path: &str) -> Config {
    if Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    }
}

fn run_bot(config_path: String, history: Option<PathBuf>) {
    let config = load_config(&config_path);
    tracing::info!("Starting {}", config.bot.name);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return;
        }
    };

    if let Err(e) = rt.block_on(run_console_bot(config, history)) {
        tracing::error!("Bot stopped: {}", e);
        std::process::exit(1);
    }
}

fn read_messages(path: &Path) -> Result<Vec<Message>, BotError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| BotError::Parse(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| BotError::Parse(format!("Failed to parse {}: {}", path.display(), e)))
}

fn scan_file(path: &Path, limit: usize) -> Result<(), BotError> {
    let messages = read_messages(path)?;
    let payouts = scan_for_payouts(messages.iter().map(Message::to_candidate), limit);

    if payouts.is_empty() {
        println!("No heist payouts found in {} messages.", messages.len());
        return Ok(());
    }

    for payout in &payouts {
        let detection = &payout.detection;
        println!(
            "{}: {} users, total {} {}, each {} {} ({})",
            payout.message.id,
            detection.recipient_count,
            CURRENCY_GLYPH,
            format_grouped(detection.total_amount),
            CURRENCY_GLYPH,
            format_grouped(detection.per_recipient_share),
            format_abbreviated(detection.per_recipient_share)
        );
    }
    Ok(())
}

async fn run_console_bot(config: Config, history: Option<PathBuf>) -> Result<(), BotError> {
    let store = Arc::new(JsonStore::new(&config.storage.directory));
    store.init().await?;
    let store: Arc<dyn Store> = store;

    let bot = ConsoleAdapter::new()
        .with_echo()
        .with_guild(GuildInfo::new(CONSOLE_GUILD, "Console"));
    let mut session = ConsoleSession::new(CONSOLE_GUILD, CONSOLE_CHANNEL, &config.payouts.payout_bot_id);

    if let Some(path) = history {
        let messages = read_messages(&path)?;
        tracing::info!("Seeding history with {} messages", messages.len());
        for message in messages.into_iter().rev() {
            if let Ok(id) = message.id.parse::<u64>() {
                session.continue_after(id);
            }
            bot.record(message)?;
        }
    }

    let icons = IconProvider::new(
        Box::new(HttpIconSource::new(config.icons.request_timeout_seconds)?),
        config.icons.ttl_seconds,
    );

    let mut cogs = CogManager::new();
    cogs.register(HeistCalculatorCog::new(
        &config.payouts.payout_bot_id,
        store.clone(),
        icons,
        CardRenderer::discover(config.icons.font_path.as_deref()),
        config.payouts.processed_capacity,
    ))?;
    cogs.register(HeistSummaryCog::new(
        &config.payouts.payout_bot_id,
        config.payouts.history_depth,
        config.payouts.max_summary_count,
    ))?;
    cogs.register(SpreeCog::new(store.clone(), &config.bot.prefix))?;
    cogs.load_all().await?;

    for cog in cogs.list_cogs() {
        tracing::info!("Cog {} ready: {}", cog.name, cog.commands.join(", "));
    }

    let mut dispatcher = EventDispatcher::new(&config.bot.prefix, cogs);

    bot.start().await?;
    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(config.spree.tick_seconds));

    loop {
        let event = tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match session.event_for(&line) {
                    Some(event) => event,
                    None => continue,
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = ticker.tick() => Event::Tick,
        };

        if let Event::MessageCreated(message) = &event {
            bot.record(message.clone())?;
        }

        if let Err(e) = dispatcher.dispatch(&bot, event, chrono::Utc::now()).await {
            tracing::error!("Error handling event: {}", e);
        }
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("Failed to render default config: {}", e),
    }
}
