mod durable;
mod memory;
mod tiered;

pub use durable::DurableTier;
pub use memory::MemoryTier;
pub use tiered::TieredCache;

use crate::zone::Zone;
use crate::Result;
use std::future::Future;
use std::time::Duration;
use time::OffsetDateTime;

#[derive(PartialEq, Debug, Clone)]
pub struct CachedZones {
    pub zones: Vec<Zone>,
    pub fetched_at: OffsetDateTime,
}

impl CachedZones {
    pub fn new(zones: Vec<Zone>, fetched_at: OffsetDateTime) -> Self {
        CachedZones { zones, fetched_at }
    }

    pub fn is_fresh(&self, ttl: Duration, now: OffsetDateTime) -> bool {
        now - self.fetched_at < ttl
    }

    /// Fetch time at the precision the durable tier keeps.
    pub fn fetched_at_millis(&self) -> i128 {
        unix_millis(self.fetched_at)
    }
}

pub fn unix_millis(time: OffsetDateTime) -> i128 {
    time.unix_timestamp_nanos() / 1_000_000
}

/// A single cache level holding at most one zone set.
pub trait CacheTier {
    fn get(&self) -> impl Future<Output = Result<Option<CachedZones>>> + Send;
    /// Fetch time of the stored entry, without loading the zones.
    fn fetched_at(&self) -> impl Future<Output = Result<Option<OffsetDateTime>>> + Send;
    fn set(&self, entry: &CachedZones) -> impl Future<Output = Result<()>> + Send;
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod test {
    use super::CachedZones;
    use std::time::Duration;
    use time::macros::datetime;

    #[test]
    fn is_fresh() {
        let entry = CachedZones::new(vec![], datetime!(2024-01-01 12:00 UTC));
        let ttl = Duration::from_secs(3600);
        assert!(entry.is_fresh(ttl, datetime!(2024-01-01 12:59 UTC)));
        assert!(!entry.is_fresh(ttl, datetime!(2024-01-01 13:00 UTC)));
        assert!(!entry.is_fresh(Duration::ZERO, datetime!(2024-01-01 12:00 UTC)));
    }
}
