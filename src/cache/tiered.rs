use super::{unix_millis, CacheTier, CachedZones, DurableTier, MemoryTier};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Memory tier in front of a durable tier. Both tiers are always written and
/// cleared together, and an empty zone set is never written.
pub struct TieredCache<M = MemoryTier, D = DurableTier> {
    memory: M,
    durable: D,
    ttl: Duration,
}

impl<M: CacheTier, D: CacheTier> TieredCache<M, D> {
    pub fn new(memory: M, durable: D, ttl: Duration) -> Self {
        Self {
            memory,
            durable,
            ttl,
        }
    }

    /// Unexpired zones, promoting a durable hit into memory. The memory copy
    /// is only trusted while the durable tier still holds the same fetch, so
    /// a clear or a refresh made by another process is picked up here.
    pub async fn get_fresh(&self, now: OffsetDateTime) -> Option<CachedZones> {
        if let Some(entry) = self.read_memory().await {
            match self.durable.fetched_at().await {
                Ok(Some(fetched_at)) if unix_millis(fetched_at) == entry.fetched_at_millis() => {
                    return entry.is_fresh(self.ttl, now).then_some(entry);
                }
                Ok(_) => {
                    info!("Durable cache changed, dropping memory copy");
                    if let Err(e) = self.memory.clear().await {
                        warn!(?e, "Failed to clear memory cache");
                    }
                }
                Err(e) => {
                    warn!(?e, "Failed to read durable cache timestamp");
                    if entry.is_fresh(self.ttl, now) {
                        return Some(entry);
                    }
                }
            }
        }
        let entry = self.read_durable().await?;
        if !entry.is_fresh(self.ttl, now) {
            return None;
        }
        info!(zones = entry.zones.len(), "Promoting durable cache into memory");
        if let Err(e) = self.memory.set(&entry).await {
            warn!(?e, "Failed to promote durable cache");
        }
        Some(entry)
    }

    /// Whatever non-empty zones are still around, expired or not.
    pub async fn get_any(&self) -> Option<CachedZones> {
        if let Some(entry) = self.read_memory().await {
            if !entry.zones.is_empty() {
                return Some(entry);
            }
        }
        self.read_durable()
            .await
            .filter(|entry| !entry.zones.is_empty())
    }

    pub async fn set(&self, entry: &CachedZones) {
        if entry.zones.is_empty() {
            warn!("Refusing to cache an empty zone set");
            return;
        }
        if let Err(e) = self.memory.set(entry).await {
            warn!(?e, "Failed to write memory cache");
        }
        if let Err(e) = self.durable.set(entry).await {
            warn!(?e, "Failed to write durable cache");
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = self.memory.clear().await {
            warn!(?e, "Failed to clear memory cache");
        }
        if let Err(e) = self.durable.clear().await {
            warn!(?e, "Failed to clear durable cache");
        }
    }

    async fn read_memory(&self) -> Option<CachedZones> {
        self.memory.get().await.unwrap_or_else(|e| {
            warn!(?e, "Failed to read memory cache");
            None
        })
    }

    async fn read_durable(&self) -> Option<CachedZones> {
        self.durable.get().await.unwrap_or_else(|e| {
            warn!(?e, "Failed to read durable cache");
            None
        })
    }
}
