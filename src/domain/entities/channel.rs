use serde::{Deserialize, Serialize};

/// Kind of guild channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
}

/// A guild channel as announced by the platform on creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub guild_id: String,
    pub name: String,
    pub kind: ChannelKind,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl ChannelInfo {
    pub fn text(id: impl Into<String>, guild_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            guild_id: guild_id.into(),
            name: name.into(),
            kind: ChannelKind::Text,
            category_id: None,
        }
    }

    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }
}
