use crate::zone::{Bounds, GeoPoint, Zone};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a click check answers while no green spaces are known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmptyZonesPolicy {
    Reject,
    Accept,
}

impl FromStr for EmptyZonesPolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "reject" => Ok(EmptyZonesPolicy::Reject),
            "accept" => Ok(EmptyZonesPolicy::Accept),
            _ => Err(Error::InvalidInput(format!(
                "Unknown empty zones policy: {value}"
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Containment {
    pub is_inside: bool,
    #[serde(rename = "spaceName", skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(rename = "spaceType", skip_serializing_if = "Option::is_none")]
    pub zone_kind: Option<String>,
}

/// Ray casting parity test. The ring is implicitly closed. Points lying
/// exactly on an edge may land on either side, but always the same one.
pub fn is_point_in_polygon(point: GeoPoint, boundary: &[GeoPoint]) -> bool {
    if boundary.len() < 3 {
        return false;
    }
    let (x, y) = (point.lon, point.lat);
    let mut inside = false;
    let mut j = boundary.len() - 1;
    for i in 0..boundary.len() {
        let (xi, yi) = (boundary[i].lon, boundary[i].lat);
        let (xj, yj) = (boundary[j].lon, boundary[j].lat);
        if (yi > y) != (yj > y) && x < xj + (y - yj) * (xi - xj) / (yi - yj) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// First zone in input order wins.
pub fn find_zone(point: GeoPoint, zones: &[Zone]) -> Option<&Zone> {
    zones
        .iter()
        .find(|zone| is_point_in_polygon(point, &zone.boundary))
}

pub fn is_point_in_zones(point: GeoPoint, zones: &[Zone]) -> Containment {
    match find_zone(point, zones) {
        Some(zone) => Containment {
            is_inside: true,
            zone_name: Some(zone.name.clone()),
            zone_kind: Some(zone.kind.clone()),
        },
        None => Containment::default(),
    }
}

pub fn is_point_in_green_space(lat: f64, lon: f64, zones: &[Zone]) -> Containment {
    is_point_in_zones(GeoPoint::new(lat, lon), zones)
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    OutOfBounds,
    OutsideGreenSpace,
    ZonesUnavailable,
}

/// Outcome of a map click. `reason` is set whenever the answer is not backed
/// by a matched zone.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct ClickCheck {
    #[serde(flatten)]
    pub containment: Containment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Vec<GeoPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

impl ClickCheck {
    fn rejected(reason: Reason) -> Self {
        ClickCheck {
            containment: Containment::default(),
            boundary: None,
            reason: Some(reason),
        }
    }
}

/// Gate for a planting click: the optional rectangle first, then the zones.
/// An accepted click carries the matched boundary for follow-up geocoding.
pub fn check_click(
    point: GeoPoint,
    zones: &[Zone],
    bounds: Option<&Bounds>,
    policy: EmptyZonesPolicy,
) -> ClickCheck {
    if let Some(bounds) = bounds {
        if !bounds.contains(point) {
            return ClickCheck::rejected(Reason::OutOfBounds);
        }
    }
    if zones.is_empty() {
        return match policy {
            EmptyZonesPolicy::Reject => ClickCheck::rejected(Reason::ZonesUnavailable),
            EmptyZonesPolicy::Accept => ClickCheck {
                containment: Containment {
                    is_inside: true,
                    ..Containment::default()
                },
                boundary: None,
                reason: Some(Reason::ZonesUnavailable),
            },
        };
    }
    match find_zone(point, zones) {
        Some(zone) => ClickCheck {
            containment: Containment {
                is_inside: true,
                zone_name: Some(zone.name.clone()),
                zone_kind: Some(zone.kind.clone()),
            },
            boundary: Some(zone.boundary.clone()),
            reason: None,
        },
        None => ClickCheck::rejected(Reason::OutsideGreenSpace),
    }
}
