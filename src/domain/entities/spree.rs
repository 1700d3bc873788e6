use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Countdown attached to a temporary channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreeChannel {
    pub end_time: DateTime<Utc>,
    /// Id of the countdown embed message inside the channel
    pub message_id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub base_seconds: u64,
    #[serde(default)]
    pub dismissed: bool,
}

/// `now` moved forward by `seconds`; `None` past the range the clock can represent
pub fn deadline_after(now: DateTime<Utc>, seconds: u64) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(seconds).ok()?;
    now.checked_add_signed(Duration::try_seconds(seconds)?)
}

impl SpreeChannel {
    pub fn starting_at(now: DateTime<Utc>, seconds: u64, message_id: impl Into<String>) -> Option<Self> {
        Some(Self {
            end_time: deadline_after(now, seconds)?,
            message_id: message_id.into(),
            guild_id: None,
            base_seconds: seconds,
            dismissed: false,
        })
    }

    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// New end time, or `None` with the countdown left untouched
    pub fn extend(&mut self, seconds: u64) -> Option<DateTime<Utc>> {
        self.end_time = deadline_after(self.end_time, seconds)?;
        self.base_seconds = self.base_seconds.saturating_add(seconds);
        Some(self.end_time)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.dismissed && self.end_time <= now
    }
}

/// Monitored categories and live countdowns, persisted as one document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpreeState {
    /// Category id to default countdown in seconds
    #[serde(default)]
    pub ephemeral_categories: BTreeMap<String, u64>,
    /// Channel id to countdown
    #[serde(default)]
    pub ephemeral_channels: BTreeMap<String, SpreeChannel>,
}

impl SpreeState {
    /// Live (not dismissed) countdowns, if any, for `channel_id`
    pub fn live_channel_mut(&mut self, channel_id: &str) -> Option<&mut SpreeChannel> {
        self.ephemeral_channels
            .get_mut(channel_id)
            .filter(|c| !c.dismissed)
    }

    /// Channels whose countdown has run out
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<String> {
        self.ephemeral_channels
            .iter()
            .filter(|(_, c)| c.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_moves_deadline() {
        let now = Utc::now();
        let mut channel = SpreeChannel::starting_at(now, 60, "m").unwrap();
        assert_eq!(channel.extend(3_600), Some(now + Duration::seconds(3_660)));
        assert_eq!(channel.end_time, now + Duration::seconds(3_660));
        assert_eq!(channel.base_seconds, 3_660);
    }

    #[test]
    fn test_unrepresentable_deadlines() {
        let now = Utc::now();
        assert!(SpreeChannel::starting_at(now, u64::MAX, "m").is_none());
        assert!(SpreeChannel::starting_at(now, 100_000_000 * 86_400, "m").is_none());

        let mut channel = SpreeChannel::starting_at(now, 60, "m").unwrap();
        channel.end_time = DateTime::<Utc>::MAX_UTC - Duration::seconds(10);
        let before = channel.clone();
        assert_eq!(channel.extend(3_600), None);
        assert_eq!(channel, before);
    }

    #[test]
    fn test_expired_skips_dismissed() {
        let now = Utc::now();
        let mut state = SpreeState::default();
        state
            .ephemeral_channels
            .insert("a".to_string(), SpreeChannel::starting_at(now, 0, "m1").unwrap());
        let mut dismissed = SpreeChannel::starting_at(now, 0, "m2").unwrap();
        dismissed.dismissed = true;
        state.ephemeral_channels.insert("b".to_string(), dismissed);
        state
            .ephemeral_channels
            .insert("c".to_string(), SpreeChannel::starting_at(now, 600, "m3").unwrap());

        assert_eq!(state.expired(now), vec!["a".to_string()]);
        assert!(state.live_channel_mut("b").is_none());
        assert!(state.live_channel_mut("c").is_some());
    }

    #[test]
    fn test_document_layout() {
        let raw = r#"{
            "ephemeral_categories": { "10": 5400 },
            "ephemeral_channels": {
                "20": { "end_time": "2024-01-01T00:00:00+00:00", "message_id": "30", "base_seconds": 5400 }
            }
        }"#;
        let state: SpreeState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.ephemeral_categories.get("10"), Some(&5400));
        assert!(!state.ephemeral_channels["20"].dismissed);
    }
}
