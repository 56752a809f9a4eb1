use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::geo::haversine_km;
use crate::models::driver::GeoPoint;
use crate::models::order::Order;
use crate::services::distance::DistanceOracle;
use crate::services::geocoder::ReverseGeocoder;
use crate::services::ServiceError;

/// Reverse lookups further than this from every known place find nothing.
const REVERSE_MATCH_KM: f64 = 0.5;

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceEntry {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Gazetteer of named addresses with coordinates.
///
/// Resolves order origins for proximity ranking and answers reverse
/// lookups with the nearest named place.
#[derive(Debug, Clone, Default)]
pub struct KnownPlaces {
    places: HashMap<String, (String, GeoPoint)>,
}

impl KnownPlaces {
    pub fn new(entries: impl IntoIterator<Item = PlaceEntry>) -> Self {
        let places = entries
            .into_iter()
            .map(|entry| {
                let point = GeoPoint {
                    lat: entry.lat,
                    lng: entry.lng,
                };
                (normalize(&entry.name), (entry.name.trim().to_string(), point))
            })
            .collect();

        Self { places }
    }

    /// Loads a JSON array of `{name, lat, lng}` entries.
    pub fn from_json_file(path: &Path) -> Result<Self, ServiceError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ServiceError::Unavailable(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ServiceError> {
        let entries: Vec<PlaceEntry> =
            serde_json::from_str(raw).map_err(|err| ServiceError::Malformed(err.to_string()))?;

        if let Some(bad) = entries.iter().find(|entry| {
            !GeoPoint {
                lat: entry.lat,
                lng: entry.lng,
            }
            .is_valid()
        }) {
            return Err(ServiceError::Malformed(format!(
                "place {:?} has invalid coordinates",
                bad.name
            )));
        }

        Ok(Self::new(entries))
    }

    pub fn locate(&self, address: &str) -> Option<GeoPoint> {
        self.places.get(&normalize(address)).map(|(_, point)| *point)
    }

    pub fn nearest(&self, point: GeoPoint) -> Option<(&str, f64)> {
        self.places
            .values()
            .map(|(name, place)| (name.as_str(), haversine_km(&point, place)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

fn normalize(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait]
impl DistanceOracle for KnownPlaces {
    async fn distance_km(&self, from: GeoPoint, order: &Order) -> Result<f64, ServiceError> {
        let pickup = self
            .locate(&order.origin)
            .ok_or_else(|| ServiceError::NoResult(format!("unknown place {:?}", order.origin)))?;

        Ok(haversine_km(&from, &pickup))
    }
}

#[async_trait]
impl ReverseGeocoder for KnownPlaces {
    async fn address_for(&self, point: GeoPoint) -> Result<String, ServiceError> {
        match self.nearest(point) {
            Some((name, km)) if km <= REVERSE_MATCH_KM => Ok(name.to_string()),
            _ => Err(ServiceError::NoResult(format!(
                "no known place near {}, {}",
                point.lat, point.lng
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAZETTEER: &str = r#"[
        {"name": "Seoul Gangnam Teheran-ro 123", "lat": 37.5, "lng": 127.0},
        {"name": "Seongnam Pangyo-ro 456", "lat": 37.4, "lng": 127.1}
    ]"#;

    #[test]
    fn lookup_ignores_case_and_spacing() {
        let places = KnownPlaces::from_json(GAZETTEER).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(
            places.locate("  seoul gangnam   TEHERAN-RO 123"),
            Some(GeoPoint {
                lat: 37.5,
                lng: 127.0
            })
        );
        assert!(places.locate("Busan").is_none());
    }

    #[test]
    fn rejects_invalid_coordinates() {
        let raw = r#"[{"name": "Nowhere", "lat": 123.0, "lng": 0.0}]"#;
        assert!(matches!(
            KnownPlaces::from_json(raw),
            Err(ServiceError::Malformed(_))
        ));
        assert!(matches!(
            KnownPlaces::from_json("not json"),
            Err(ServiceError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn reverse_lookup_needs_a_close_place() {
        let places = KnownPlaces::from_json(GAZETTEER).unwrap();

        let near = places
            .address_for(GeoPoint {
                lat: 37.5001,
                lng: 127.0001,
            })
            .await;
        assert_eq!(near.as_deref(), Ok("Seoul Gangnam Teheran-ro 123"));

        let far = places
            .address_for(GeoPoint {
                lat: 35.1,
                lng: 129.0,
            })
            .await;
        assert!(matches!(far, Err(ServiceError::NoResult(_))));
    }
}
