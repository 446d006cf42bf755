use crate::zone::{Bounds, GeoPoint, Zone, DEFAULT_ZONE_KIND, DEFAULT_ZONE_NAME};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, info};

pub static DEFAULT_API_URL: &str = "https://overpass-api.de/api/interpreter";

/// Feature filters which count as a green space.
pub static CATEGORIES: &[&str] = &[
    r#"["leisure"="park"]"#,
    r#"["leisure"="garden"]"#,
    r#"["landuse"="recreation_ground"]"#,
    r#"["leisure"="playground"]"#,
    r#"["leisure"="pitch"]"#,
    r#"["leisure"="dog_park"]"#,
    r#"["landuse"="grass"]"#,
    r#"["landuse"="meadow"]"#,
    r#"["landuse"="village_green"]"#,
    r#"["highway"="pedestrian"]["area"="yes"]"#,
    r#"["natural"="wood"]"#,
    r#"["natural"="scrub"]"#,
    r#"["natural"="grassland"]"#,
];

/// Tags consulted, in order, to classify a zone.
static KIND_TAGS: &[&str] = &["leisure", "landuse", "natural", "place", "highway"];

const QUERY_TIMEOUT_SECS: u32 = 25;

#[derive(Serialize, Deserialize)]
struct Response {
    #[serde(default)]
    osm3s: Option<Osm3s>,
    elements: Vec<OverpassElement>,
}

#[derive(Serialize, Deserialize)]
struct Osm3s {
    timestamp_osm_base: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OverpassElement {
    pub r#type: String,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>, // for nodes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>, // for nodes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<i64>>, // for ways only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

impl OverpassElement {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .as_ref()
            .and_then(|tags| tags.get(name))
            .map(|it| it.as_str())
    }

    #[cfg(test)]
    pub fn mock_node(id: i64, lat: f64, lon: f64) -> OverpassElement {
        OverpassElement {
            r#type: "node".into(),
            id,
            lat: Some(lat),
            lon: Some(lon),
            nodes: None,
            tags: None,
        }
    }

    #[cfg(test)]
    pub fn mock_way(id: i64, nodes: &[i64], tags: &[(&str, &str)]) -> OverpassElement {
        OverpassElement {
            r#type: "way".into(),
            id,
            lat: None,
            lon: None,
            nodes: Some(nodes.to_vec()),
            tags: Some(
                tags.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }
}

/// Anything that can produce the current set of green spaces.
pub trait ZoneSource {
    fn fetch(&self) -> impl Future<Output = Result<Vec<Zone>>> + Send;
}

pub struct OverpassClient {
    client: reqwest::Client,
    api_url: String,
    query: String,
}

impl OverpassClient {
    pub fn new(api_url: &str, bounds: &Bounds) -> Self {
        OverpassClient {
            client: reqwest::Client::new(),
            api_url: api_url.to_string(),
            query: build_query(bounds),
        }
    }
}

impl ZoneSource for OverpassClient {
    async fn fetch(&self) -> Result<Vec<Zone>> {
        info!(api_url = self.api_url.as_str(), "Querying Overpass API");
        debug!(query = self.query.as_str());

        let response = self
            .client
            .post(&self.api_url)
            .body(self.query.clone())
            .send()
            .await?;

        info!(http_status_code = ?response.status(), "Got Overpass API response");

        if !response.status().is_success() {
            return Err(Error::OverpassApi(format!(
                "Unexpected status code: {}",
                response.status()
            )));
        }

        let response = response.json::<Response>().await?;

        if let Some(osm3s) = &response.osm3s {
            info!(
                timestamp_osm_base = osm3s.timestamp_osm_base.as_str(),
                elements = response.elements.len(),
                "Fetched elements",
            );
        }

        Ok(parse_zones(&response.elements))
    }
}

pub fn build_query(bounds: &Bounds) -> String {
    let bbox = bounds.overpass_bbox();
    let filters: String = CATEGORIES
        .iter()
        .map(|category| format!("  way{category}({bbox});\n"))
        .collect();
    format!("[out:json][timeout:{QUERY_TIMEOUT_SECS}];\n(\n{filters});\nout body;\n>;\nout skel qt;\n")
}

/// Resolves way node references into ordered boundaries. Ways with fewer than
/// 3 resolvable nodes can't form a polygon and are dropped.
pub fn parse_zones(elements: &[OverpassElement]) -> Vec<Zone> {
    let nodes: HashMap<i64, GeoPoint> = elements
        .iter()
        .filter(|it| it.r#type == "node")
        .filter_map(|it| match (it.lat, it.lon) {
            (Some(lat), Some(lon)) => Some((it.id, GeoPoint::new(lat, lon))),
            _ => None,
        })
        .collect();

    let mut zones = vec![];
    let mut dropped = 0;

    for way in elements.iter().filter(|it| it.r#type == "way") {
        let boundary: Vec<GeoPoint> = way
            .nodes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|id| nodes.get(id).copied())
            .collect();

        if boundary.len() < 3 {
            dropped += 1;
            continue;
        }

        zones.push(Zone {
            id: way.id,
            name: way.tag("name").unwrap_or(DEFAULT_ZONE_NAME).to_string(),
            kind: KIND_TAGS
                .iter()
                .find_map(|tag| way.tag(tag))
                .unwrap_or(DEFAULT_ZONE_KIND)
                .to_string(),
            boundary,
        });
    }

    debug!(nodes = nodes.len(), zones = zones.len(), dropped, "Parsed zones");

    zones
}
