use crate::cache::{CachedZones, DurableTier, MemoryTier, TieredCache};
use crate::conf::Conf;
use crate::overpass::{OverpassClient, ZoneSource};
use crate::zone::Zone;
use deadpool_sqlite::Pool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub trait Delay {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

pub struct TokioDelay;

impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: 3,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

/// Hands out the current green spaces, hitting the upstream source only when
/// both cache tiers miss. Never fails: upstream and storage errors degrade to
/// stale or empty results.
pub struct GreenSpaceProvider<S, D = TokioDelay> {
    cache: TieredCache,
    source: S,
    delay: D,
    retry: RetryPolicy,
    // Serializes cache check, fetch and cache write
    lock: Mutex<()>,
}

impl GreenSpaceProvider<OverpassClient> {
    pub fn from_conf(conf: &Conf, pool: &Arc<Pool>) -> Self {
        GreenSpaceProvider::new(
            TieredCache::new(MemoryTier::new(), DurableTier::new(pool), conf.cache_ttl),
            OverpassClient::new(&conf.overpass_api_url, &conf.bounds),
            TokioDelay,
            RetryPolicy {
                retries: conf.retries,
                initial_backoff: conf.initial_backoff,
            },
        )
    }
}

impl<S: ZoneSource, D: Delay> GreenSpaceProvider<S, D> {
    pub fn new(cache: TieredCache, source: S, delay: D, retry: RetryPolicy) -> Self {
        GreenSpaceProvider {
            cache,
            source,
            delay,
            retry,
            lock: Mutex::new(()),
        }
    }

    pub async fn get_zones(&self) -> Vec<Zone> {
        let _guard = self.lock.lock().await;

        if let Some(entry) = self.cache.get_fresh(OffsetDateTime::now_utc()).await {
            return entry.zones;
        }

        let zones = self
            .fetch_zones(self.retry.retries, self.retry.initial_backoff)
            .await;

        if !zones.is_empty() {
            info!(zones = zones.len(), "Caching green spaces");
            self.cache
                .set(&CachedZones::new(zones.clone(), OffsetDateTime::now_utc()))
                .await;
            return zones;
        }

        match self.cache.get_any().await {
            Some(stale) => {
                warn!(
                    zones = stale.zones.len(),
                    fetched_at = %stale.fetched_at,
                    "Fetch came back empty, serving stale green spaces",
                );
                stale.zones
            }
            None => {
                warn!("No green spaces available");
                vec![]
            }
        }
    }

    pub async fn clear_cache(&self) {
        let _guard = self.lock.lock().await;
        self.cache.clear().await;
        info!("Green spaces cache cleared");
    }

    /// Empty results are retried like failures since the upstream sometimes
    /// answers with nothing under load. Backoff doubles after every sleep.
    pub async fn fetch_zones(
        &self,
        mut retries_remaining: u32,
        mut backoff: Duration,
    ) -> Vec<Zone> {
        let mut attempt = 1;
        loop {
            match self.source.fetch().await {
                Ok(zones) if !zones.is_empty() => {
                    info!(attempt, zones = zones.len(), "Fetched green spaces");
                    return zones;
                }
                Ok(_) => warn!(attempt, "Upstream returned no green spaces"),
                Err(e) => warn!(attempt, ?e, "Failed to fetch green spaces"),
            }

            if retries_remaining == 0 {
                warn!(attempt, "Out of retries");
                return vec![];
            }

            info!(
                backoff_ms = backoff.as_millis() as u64,
                retries_remaining, "Retrying",
            );
            self.delay.sleep(backoff).await;
            retries_remaining -= 1;
            backoff = backoff.saturating_mul(2);
            attempt += 1;
        }
    }
}
