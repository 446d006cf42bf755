use crate::conf::Conf;
use crate::containment::check_click;
use crate::provider::GreenSpaceProvider;
use crate::zone::GeoPoint;
use crate::{db, Error, Result};
use std::sync::Arc;
use tracing::info;

/// Warms the cache. A running server notices the new durable entry on its
/// next read and swaps its memory copy.
pub async fn fetch(conf: Conf) -> Result<()> {
    let pool = Arc::new(db::pool(&conf)?);
    let zones = GreenSpaceProvider::from_conf(&conf, &pool).get_zones().await;
    info!(zones = zones.len(), "Loaded green spaces");
    if zones.is_empty() {
        Err(Error::OverpassApi("No green spaces available".into()))?
    }
    Ok(())
}

pub async fn check(args: &[String], conf: Conf) -> Result<()> {
    let [lat, lon] = args else {
        return Err(Error::Cli("Usage: check <lat> <lon>".into()));
    };
    let lat: f64 = lat
        .parse()
        .map_err(|e| Error::Cli(format!("Invalid latitude {lat}: {e}")))?;
    let lon: f64 = lon
        .parse()
        .map_err(|e| Error::Cli(format!("Invalid longitude {lon}: {e}")))?;
    let pool = Arc::new(db::pool(&conf)?);
    let point = GeoPoint::new(lat, lon);
    let zones = GreenSpaceProvider::from_conf(&conf, &pool).get_zones().await;
    let res = check_click(point, &zones, Some(&conf.bounds), conf.empty_zones_policy);
    println!("{}", serde_json::to_string_pretty(&res)?);
    Ok(())
}

/// Clears the durable tier. A running server drops its memory copy once it
/// sees the durable entry is gone.
pub async fn clear_cache(conf: Conf) -> Result<()> {
    let pool = Arc::new(db::pool(&conf)?);
    GreenSpaceProvider::from_conf(&conf, &pool).clear_cache().await;
    Ok(())
}
