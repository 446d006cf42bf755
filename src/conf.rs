use crate::containment::EmptyZonesPolicy;
use crate::overpass::DEFAULT_API_URL;
use crate::zone::Bounds;
use crate::{Error, Result};
use std::env;
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// New York City, the marketplace's launch area.
pub const DEFAULT_BBOX: &str = "40.4774,-74.2591,40.9176,-73.7004";
pub const DEFAULT_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_SERVER_BIND: &str = "127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Conf {
    pub overpass_api_url: String,
    pub bounds: Bounds,
    pub cache_ttl: Duration,
    pub retries: u32,
    pub initial_backoff: Duration,
    pub empty_zones_policy: EmptyZonesPolicy,
    pub data_dir: PathBuf,
    pub server_bind: String,
}

impl Conf {
    pub fn from_env() -> Result<Conf> {
        Conf::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Conf> {
        let data_dir = match lookup("DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        Ok(Conf {
            overpass_api_url: lookup("OVERPASS_API_URL").unwrap_or(DEFAULT_API_URL.into()),
            bounds: Bounds::parse(&lookup("GREEN_SPACES_BBOX").unwrap_or(DEFAULT_BBOX.into()))?,
            cache_ttl: Duration::from_secs(parse_or(
                "GREEN_SPACES_TTL_SECS",
                lookup("GREEN_SPACES_TTL_SECS"),
                DEFAULT_TTL_SECS,
            )?),
            retries: parse_or("OVERPASS_RETRIES", lookup("OVERPASS_RETRIES"), DEFAULT_RETRIES)?,
            initial_backoff: Duration::from_millis(parse_or(
                "OVERPASS_BACKOFF_MS",
                lookup("OVERPASS_BACKOFF_MS"),
                DEFAULT_BACKOFF_MS,
            )?),
            empty_zones_policy: parse_or(
                "EMPTY_ZONES_POLICY",
                lookup("EMPTY_ZONES_POLICY"),
                EmptyZonesPolicy::Reject,
            )?,
            data_dir,
            server_bind: lookup("SERVER_BIND").unwrap_or(DEFAULT_SERVER_BIND.into()),
        })
    }

    pub fn data_dir_file_path(&self, file_name: &str) -> Result<PathBuf> {
        if !self.data_dir.exists() {
            create_dir_all(&self.data_dir)?;
        }
        Ok(self.data_dir.join(file_name))
    }
}

fn parse_or<T>(name: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value
            .parse()
            .map_err(|e| Error::InvalidInput(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}

fn default_data_dir() -> Result<PathBuf> {
    #[allow(deprecated)]
    let home = env::home_dir().ok_or("Home directory does not exist")?;
    Ok(home.join(".local/share/greenspace-geofence"))
}

#[cfg(test)]
mod test {
    use super::{Conf, DEFAULT_RETRIES};
    use crate::containment::EmptyZonesPolicy;
    use crate::Result;
    use std::collections::HashMap;
    use std::time::Duration;

    fn conf(vars: &[(&str, &str)]) -> Result<Conf> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Conf::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() -> Result<()> {
        let conf = conf(&[("DATA_DIR", "/tmp/green")])?;
        assert_eq!(Duration::from_secs(3600), conf.cache_ttl);
        assert_eq!(DEFAULT_RETRIES, conf.retries);
        assert_eq!(Duration::from_millis(1000), conf.initial_backoff);
        assert_eq!(EmptyZonesPolicy::Reject, conf.empty_zones_policy);
        assert_eq!("/tmp/green", conf.data_dir.to_str().unwrap());
        Ok(())
    }

    #[test]
    fn overrides() -> Result<()> {
        let conf = conf(&[
            ("DATA_DIR", "/tmp/green"),
            ("GREEN_SPACES_BBOX", "0,0,1,1"),
            ("GREEN_SPACES_TTL_SECS", "60"),
            ("OVERPASS_RETRIES", "5"),
            ("EMPTY_ZONES_POLICY", "accept"),
        ])?;
        assert_eq!(1.0, conf.bounds.max_lat);
        assert_eq!(Duration::from_secs(60), conf.cache_ttl);
        assert_eq!(5, conf.retries);
        assert_eq!(EmptyZonesPolicy::Accept, conf.empty_zones_policy);
        Ok(())
    }

    #[test]
    fn invalid_values() {
        assert!(conf(&[("DATA_DIR", "/tmp"), ("OVERPASS_RETRIES", "-1")]).is_err());
        assert!(conf(&[("DATA_DIR", "/tmp"), ("EMPTY_ZONES_POLICY", "maybe")]).is_err());
        assert!(conf(&[("DATA_DIR", "/tmp"), ("GREEN_SPACES_BBOX", "1,2")]).is_err());
    }
}
