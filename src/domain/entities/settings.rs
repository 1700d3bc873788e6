use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reply style of the heist calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Text,
    Image,
}

impl Template {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "text" => Some(Template::Text),
            "image" => Some(Template::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Text => "text",
            Template::Image => "image",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calculator toggles of one guild.
///
/// Stored as a flat object: `global`, `template`, then one boolean per channel id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuildCalculatorSettings {
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub template: Template,
    #[serde(flatten)]
    pub channels: BTreeMap<String, bool>,
}

impl GuildCalculatorSettings {
    pub fn is_enabled_in(&self, channel_id: &str) -> bool {
        self.global || self.channels.get(channel_id).copied().unwrap_or(false)
    }

    pub fn set_channel(&mut self, channel_id: impl Into<String>, enabled: bool) {
        self.channels.insert(channel_id.into(), enabled);
    }
}

/// Calculator settings of every guild, keyed by guild id
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeistSettings {
    guilds: BTreeMap<String, GuildCalculatorSettings>,
}

impl HeistSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: &str) -> Option<&GuildCalculatorSettings> {
        self.guilds.get(guild_id)
    }

    /// Settings of `guild_id`, created with defaults on first access
    pub fn guild_mut(&mut self, guild_id: &str) -> &mut GuildCalculatorSettings {
        self.guilds.entry(guild_id.to_string()).or_default()
    }

    pub fn is_enabled(&self, guild_id: &str, channel_id: &str) -> bool {
        self.get(guild_id)
            .map(|g| g.is_enabled_in(channel_id))
            .unwrap_or(false)
    }

    pub fn template(&self, guild_id: &str) -> Template {
        self.get(guild_id).map(|g| g.template).unwrap_or_default()
    }
}
