//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub payouts: PayoutConfig,
    pub spree: SpreeConfig,
    pub icons: IconConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PayoutConfig {
    /// Account that posts payout announcements
    pub payout_bot_id: String,
    /// Messages read back by the summary command
    pub history_depth: usize,
    /// Upper bound of `heists_count`
    pub max_summary_count: usize,
    /// Message ids remembered for de-duplication
    pub processed_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpreeConfig {
    pub tick_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IconConfig {
    pub ttl_seconds: u64,
    pub request_timeout_seconds: u64,
    /// TrueType font for image payouts; system fonts are tried when unset
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    pub directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "heist-bot".to_string(),
                prefix: "!".to_string(),
            },
            payouts: PayoutConfig {
                payout_bot_id: "270904126974590976".to_string(),
                history_depth: 100,
                max_summary_count: 5,
                processed_capacity: 10_000,
            },
            spree: SpreeConfig {
                tick_seconds: 30,
            },
            icons: IconConfig {
                ttl_seconds: 600,
                request_timeout_seconds: 10,
                font_path: None,
            },
            storage: StorageConfig {
                directory: PathBuf::from("./storage"),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            config.bot.prefix = prefix;
        }

        if let Ok(id) = std::env::var("PAYOUT_BOT_ID") {
            config.payouts.payout_bot_id = id;
        }

        if let Ok(dir) = std::env::var("STORAGE_DIR") {
            config.storage.directory = PathBuf::from(dir);
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.is_empty() {
            return Err(ConfigError::MissingField("bot.prefix".to_string()));
        }
        if self.payouts.payout_bot_id.is_empty() {
            return Err(ConfigError::MissingField("payouts.payout-bot-id".to_string()));
        }
        if self.payouts.max_summary_count == 0 {
            return Err(ConfigError::InvalidValue(
                "payouts.max-summary-count must be at least 1".to_string(),
            ));
        }
        if self.spree.tick_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "spree.tick-seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("payout-bot-id"));

        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.payouts.history_depth, 100);
        assert_eq!(config.spree.tick_seconds, 30);
    }

    #[test]
    fn test_font_path_is_optional() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let without = yaml.replace("  font-path: null\n", "");
        assert_eq!(Config::from_yaml(&without).unwrap().icons.font_path, None);

        let with = without.replace("icons:\n", "icons:\n  font-path: /fonts/card.ttf\n");
        assert_eq!(
            Config::from_yaml(&with).unwrap().icons.font_path,
            Some(PathBuf::from("/fonts/card.ttf"))
        );
    }

    #[test]
    fn test_rejects_zero_tick() {
        let mut config = Config::default();
        config.spree.tick_seconds = 0;
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(matches!(Config::from_yaml(&yaml), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_rejects_missing_sections() {
        assert!(matches!(
            Config::from_yaml("bot:\n  name: x\n  prefix: '!'\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
