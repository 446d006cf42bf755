use crate::{Error, Result};
use geo::{coord, Coord, Intersects, Rect};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ZONE_NAME: &str = "Green Space";
pub const DEFAULT_ZONE_KIND: &str = "green_space";

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

impl From<GeoPoint> for Coord {
    fn from(point: GeoPoint) -> Self {
        coord! { x: point.lon, y: point.lat }
    }
}

/// A green space polygon that plantings are allowed in.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub boundary: Vec<GeoPoint>,
}

impl Zone {
    /// Closes the ring so GeoJSON consumers get a valid linear ring.
    pub fn to_feature(&self) -> Feature {
        let mut ring: Vec<Vec<f64>> = self.boundary.iter().map(|p| vec![p.lon, p.lat]).collect();
        if ring.first() != ring.last() {
            if let Some(first) = ring.first().cloned() {
                ring.push(first);
            }
        }
        let mut properties = JsonObject::new();
        properties.insert("id".into(), Value::from(self.id));
        properties.insert("name".into(), Value::from(self.name.clone()));
        properties.insert("kind".into(), Value::from(self.kind.clone()));
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::Polygon(vec![ring]))),
            id: Some(geojson::feature::Id::Number(self.id.into())),
            properties: Some(properties),
            foreign_members: None,
        }
    }

    #[cfg(test)]
    pub fn mock(id: i64, boundary: &[(f64, f64)]) -> Zone {
        Zone {
            id,
            name: format!("Zone {id}"),
            kind: "park".into(),
            boundary: boundary
                .iter()
                .map(|(lat, lon)| GeoPoint::new(*lat, *lon))
                .collect(),
        }
    }
}

pub fn to_feature_collection(zones: &[Zone]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: zones.iter().map(Zone::to_feature).collect(),
        foreign_members: None,
    }
}

/// Rectangular lat/lon box, used as the fetch area and as a coarse pre-filter.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Parses `south,west,north,east`, the order Overpass uses for bbox filters.
    pub fn parse(value: &str) -> Result<Bounds> {
        let parts: Vec<f64> = value
            .split(',')
            .map(|it| it.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::InvalidInput(format!("Invalid bounds {value}: {e}")))?;
        let [min_lat, min_lon, max_lat, max_lon] = parts[..] else {
            return Err(Error::InvalidInput(format!(
                "Expected 4 comma separated numbers, got: {value}"
            )));
        };
        if min_lat > max_lat || min_lon > max_lon {
            return Err(Error::InvalidInput(format!(
                "Bounds are inverted: {value}"
            )));
        }
        Ok(Bounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    pub fn overpass_bbox(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }

    /// Inclusive on every edge.
    pub fn contains(&self, point: GeoPoint) -> bool {
        let rect = Rect::new(
            coord! { x: self.min_lon, y: self.min_lat },
            coord! { x: self.max_lon, y: self.max_lat },
        );
        rect.intersects(&Coord::from(point))
    }
}
