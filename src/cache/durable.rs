use super::{CacheTier, CachedZones};
use crate::db::cache_entry::queries;
use crate::zone::Zone;
use crate::Result;
use deadpool_sqlite::Pool;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::warn;

pub const ZONES_KEY: &str = "green_spaces";
pub const TIMESTAMP_KEY: &str = "green_spaces_timestamp";

/// SQLite backed tier, survives restarts. Stores the zone list as JSON and
/// the fetch time as unix milliseconds under two separate keys.
#[derive(Clone)]
pub struct DurableTier {
    pool: Arc<Pool>,
}

// Tolerated drift between the writer's clock and ours
const MAX_CLOCK_SKEW: Duration = Duration::from_secs(60);

impl DurableTier {
    pub fn new(pool: &Arc<Pool>) -> Self {
        Self { pool: pool.clone() }
    }

    fn decode(zones: &str, timestamp: &str, now: OffsetDateTime) -> Result<CachedZones> {
        let fetched_at = Self::parse_timestamp(timestamp)?;
        if fetched_at > now + MAX_CLOCK_SKEW {
            Err(format!("Timestamp {fetched_at} is in the future"))?
        }
        let zones: Vec<Zone> = serde_json::from_str(zones)?;
        Ok(CachedZones::new(zones, fetched_at))
    }

    fn parse_timestamp(timestamp: &str) -> Result<OffsetDateTime> {
        let timestamp: i64 = timestamp
            .parse()
            .map_err(|e| format!("Invalid timestamp {timestamp}: {e}"))?;
        Ok(OffsetDateTime::from_unix_timestamp_nanos(
            timestamp as i128 * 1_000_000,
        )?)
    }

    fn keys() -> Vec<String> {
        vec![ZONES_KEY.into(), TIMESTAMP_KEY.into()]
    }

    async fn drop_entry(&self) -> Result<()> {
        queries::delete_all(Self::keys(), &self.pool).await
    }
}

impl CacheTier for DurableTier {
    async fn get(&self) -> Result<Option<CachedZones>> {
        let values: [Option<String>; 2] = queries::select_values(Self::keys(), &self.pool)
            .await?
            .try_into()
            .map_err(|_| "Expected a value slot per durable cache key")?;
        let (zones, timestamp) = match values {
            [Some(zones), Some(timestamp)] => (zones, timestamp),
            [None, None] => return Ok(None),
            _ => {
                warn!("Durable cache is missing one of its keys, dropping it");
                self.drop_entry().await?;
                return Ok(None);
            }
        };
        match Self::decode(&zones, &timestamp, OffsetDateTime::now_utc()) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(?e, "Durable cache is corrupted, dropping it");
                self.drop_entry().await?;
                Ok(None)
            }
        }
    }

    async fn fetched_at(&self) -> Result<Option<OffsetDateTime>> {
        let timestamp = queries::select_value(TIMESTAMP_KEY, &self.pool).await?;
        // A garbled timestamp reads as "no entry", the next get drops it
        Ok(timestamp.and_then(|it| Self::parse_timestamp(&it).ok()))
    }

    async fn set(&self, entry: &CachedZones) -> Result<()> {
        let zones = serde_json::to_string(&entry.zones)?;
        let timestamp = entry.fetched_at_millis().to_string();
        queries::upsert_all(
            vec![(ZONES_KEY.into(), zones), (TIMESTAMP_KEY.into(), timestamp)],
            &self.pool,
        )
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.drop_entry().await
    }
}

#[cfg(test)]
mod test {
    use super::{DurableTier, TIMESTAMP_KEY, ZONES_KEY};
    use crate::cache::{CacheTier, CachedZones};
    use crate::db::cache_entry::queries;
    use crate::db::test::pool;
    use crate::zone::Zone;
    use crate::Result;
    use std::sync::Arc;
    use std::time::Duration;
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn entry() -> CachedZones {
        CachedZones::new(
            vec![Zone::mock(1, &[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)])],
            datetime!(2024-05-01 10:30:15.250 UTC),
        )
    }

    #[actix_web::test]
    async fn set_get_clear() -> Result<()> {
        let pool = Arc::new(pool());
        let tier = DurableTier::new(&pool);
        assert_eq!(None, tier.get().await?);
        tier.set(&entry()).await?;
        assert_eq!(Some(entry()), tier.get().await?);
        assert_eq!(Some(entry().fetched_at), tier.fetched_at().await?);
        assert_eq!(
            Some("1714559415250".to_string()),
            queries::select_value(TIMESTAMP_KEY, &pool).await?
        );
        tier.clear().await?;
        tier.clear().await?;
        assert_eq!(None, tier.get().await?);
        Ok(())
    }

    #[actix_web::test]
    async fn corrupted_json_is_a_miss() -> Result<()> {
        let pool = Arc::new(pool());
        let tier = DurableTier::new(&pool);
        tier.set(&entry()).await?;
        queries::upsert_all(vec![(ZONES_KEY.into(), "[{\"id\":".into())], &pool).await?;
        assert_eq!(None, tier.get().await?);
        assert_eq!(None, queries::select_value(ZONES_KEY, &pool).await?);
        assert_eq!(None, queries::select_value(TIMESTAMP_KEY, &pool).await?);
        Ok(())
    }

    #[actix_web::test]
    async fn corrupted_timestamp_is_a_miss() -> Result<()> {
        let pool = Arc::new(pool());
        let tier = DurableTier::new(&pool);
        tier.set(&entry()).await?;
        queries::upsert_all(vec![(TIMESTAMP_KEY.into(), "yesterday".into())], &pool).await?;
        assert_eq!(None, tier.get().await?);
        assert_eq!(None, queries::select_value(ZONES_KEY, &pool).await?);
        Ok(())
    }

    #[actix_web::test]
    async fn future_timestamp_is_a_miss() -> Result<()> {
        let pool = Arc::new(pool());
        let tier = DurableTier::new(&pool);
        let far_future = OffsetDateTime::now_utc() + Duration::from_secs(10 * 365 * 24 * 3600);
        tier.set(&CachedZones::new(entry().zones, far_future)).await?;
        assert_eq!(None, tier.get().await?);
        assert_eq!(None, queries::select_value(ZONES_KEY, &pool).await?);
        assert_eq!(None, queries::select_value(TIMESTAMP_KEY, &pool).await?);
        Ok(())
    }

    #[actix_web::test]
    async fn small_clock_skew_is_tolerated() -> Result<()> {
        let pool = Arc::new(pool());
        let tier = DurableTier::new(&pool);
        let ahead = OffsetDateTime::now_utc() + Duration::from_secs(5);
        tier.set(&CachedZones::new(entry().zones, ahead)).await?;
        assert_eq!(Some(entry().zones), tier.get().await?.map(|it| it.zones));
        Ok(())
    }

    #[actix_web::test]
    async fn orphan_key_is_a_miss() -> Result<()> {
        let pool = Arc::new(pool());
        let tier = DurableTier::new(&pool);
        queries::upsert_all(vec![(ZONES_KEY.into(), "[]".into())], &pool).await?;
        assert_eq!(None, tier.get().await?);
        assert_eq!(None, queries::select_value(ZONES_KEY, &pool).await?);
        Ok(())
    }
}
