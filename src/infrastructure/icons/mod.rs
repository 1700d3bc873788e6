//! Guild icon download and caching

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::collections::HashMap;

use crate::application::errors::BotError;
use crate::domain::card::GuildIcon;

/// Source of raw icon bytes
#[async_trait]
pub trait IconSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BotError>;
}

/// Downloads icons over HTTP
pub struct HttpIconSource {
    client: Client,
}

impl HttpIconSource {
    pub fn new(timeout_seconds: u64) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| BotError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl IconSource for HttpIconSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BotError> {
        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "HTTP {} error fetching icon",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;
        if bytes.is_empty() {
            return Err(BotError::Parse("empty icon body".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Clone)]
struct CachedIcon {
    icon: GuildIcon,
    fetched_at: DateTime<Utc>,
}

/// Icons keyed by guild id, valid for a fixed time-to-live
pub struct IconCache {
    ttl: Duration,
    entries: HashMap<String, CachedIcon>,
}

impl IconCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds as i64),
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, guild_id: &str, now: DateTime<Utc>) -> Option<&GuildIcon> {
        self.entries
            .get(guild_id)
            .filter(|e| now - e.fetched_at < self.ttl)
            .map(|e| &e.icon)
    }

    pub fn insert(&mut self, guild_id: impl Into<String>, icon: GuildIcon, now: DateTime<Utc>) {
        self.entries.insert(guild_id.into(), CachedIcon { icon, fetched_at: now });
    }

    pub fn invalidate(&mut self, guild_id: &str) {
        self.entries.remove(guild_id);
    }

    /// Removes stale entries, returns how many were dropped
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, e| now - e.fetched_at < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cached icon lookup with a blank fallback
pub struct IconProvider {
    source: Box<dyn IconSource>,
    cache: IconCache,
}

impl IconProvider {
    pub fn new(source: Box<dyn IconSource>, ttl_seconds: u64) -> Self {
        Self {
            source,
            cache: IconCache::new(ttl_seconds),
        }
    }

    /// Icon for `guild_id`; failures are cached as a blank icon
    pub async fn icon_for(&mut self, guild_id: &str, url: Option<&str>, now: DateTime<Utc>) -> GuildIcon {
        if let Some(icon) = self.cache.get(guild_id, now) {
            tracing::debug!("Using cached icon for guild {}", guild_id);
            return icon.clone();
        }

        let icon = match url {
            None => {
                tracing::debug!("No icon for guild {}; using blank image", guild_id);
                GuildIcon::Blank
            }
            Some(url) => match self.source.fetch(url).await {
                Ok(bytes) => {
                    tracing::debug!("Fetched new icon for guild {}", guild_id);
                    GuildIcon::Encoded(bytes)
                }
                Err(e) => {
                    tracing::error!("Error fetching server icon for guild {}: {}", guild_id, e);
                    GuildIcon::Blank
                }
            },
        };

        self.cache.insert(guild_id, icon.clone(), now);
        icon
    }

    /// Forgets the cached icon and fetches it again
    pub async fn refresh(&mut self, guild_id: &str, url: Option<&str>, now: DateTime<Utc>) -> GuildIcon {
        self.cache.invalidate(guild_id);
        self.icon_for(guild_id, url, now).await
    }

    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        self.cache.evict_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl IconSource for CountingSource {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, BotError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(BotError::Network("HTTP 404".to_string()))
            } else {
                Ok(vec![1, 2, 3])
            }
        }
    }

    fn provider(fail: bool) -> (IconProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource { calls: calls.clone(), fail };
        (IconProvider::new(Box::new(source), 600), calls)
    }

    #[tokio::test]
    async fn test_cached_within_ttl() {
        let (mut icons, calls) = provider(false);
        let now = Utc::now();

        let first = icons.icon_for("g", Some("http://icon"), now).await;
        let second = icons.icon_for("g", Some("http://icon"), now + Duration::seconds(599)).await;
        assert_eq!(first, GuildIcon::Encoded(vec![1, 2, 3]));
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        icons.icon_for("g", Some("http://icon"), now + Duration::seconds(600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_blank() {
        let (mut icons, calls) = provider(true);
        let now = Utc::now();

        assert_eq!(icons.icon_for("g", Some("http://icon"), now).await, GuildIcon::Blank);
        assert_eq!(icons.icon_for("g", Some("http://icon"), now).await, GuildIcon::Blank);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_refetches() {
        let (mut icons, calls) = provider(false);
        let now = Utc::now();

        icons.icon_for("g", Some("http://icon"), now).await;
        icons.refresh("g", Some("http://icon"), now).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(icons.icon_for("g", None, now).await, GuildIcon::Encoded(vec![1, 2, 3]));
    }

    #[test]
    fn test_evict_expired() {
        let mut cache = IconCache::new(60);
        let now = Utc::now();
        cache.insert("old", GuildIcon::Blank, now - Duration::seconds(120));
        cache.insert("new", GuildIcon::Blank, now);

        assert_eq!(cache.evict_expired(now), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("new", now).is_some());
    }
}
