use super::{CacheTier, CachedZones};
use crate::Result;
use std::sync::RwLock;
use time::OffsetDateTime;

/// Process local tier, gone after a restart.
#[derive(Default)]
pub struct MemoryTier {
    entry: RwLock<Option<CachedZones>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheTier for MemoryTier {
    async fn get(&self) -> Result<Option<CachedZones>> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        Ok(entry.clone())
    }

    async fn fetched_at(&self) -> Result<Option<OffsetDateTime>> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        Ok(entry.as_ref().map(|it| it.fetched_at))
    }

    async fn set(&self, entry: &CachedZones) -> Result<()> {
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = Some(entry.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::MemoryTier;
    use crate::cache::{CacheTier, CachedZones};
    use crate::zone::Zone;
    use crate::Result;
    use time::OffsetDateTime;

    #[actix_web::test]
    async fn set_get_clear() -> Result<()> {
        let tier = MemoryTier::new();
        assert_eq!(None, tier.get().await?);
        let entry = CachedZones::new(
            vec![Zone::mock(1, &[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)])],
            OffsetDateTime::now_utc(),
        );
        tier.set(&entry).await?;
        assert_eq!(Some(entry.fetched_at), tier.fetched_at().await?);
        assert_eq!(Some(entry), tier.get().await?);
        tier.clear().await?;
        tier.clear().await?;
        assert_eq!(None, tier.get().await?);
        Ok(())
    }
}
