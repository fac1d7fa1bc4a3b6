//! Free-text place search against a Photon-compatible geocoder.
//!
//! Search is best effort: any failure is logged and turned into an empty
//! result list so the birth-place field simply shows no suggestions.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::error::ChartError;

const MIN_QUERY_CHARS: usize = 2;
const PLACE_KINDS: [&str; 3] = ["city", "town", "village"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    /// "City, State, Country" as shown in the place picker.
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// GeoJSON order: longitude, latitude.
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    name: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    osm_key: Option<String>,
}

impl Properties {
    fn is_settlement(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| PLACE_KINDS.contains(&k))
            || self.osm_key.as_deref() == Some("place")
    }

    fn label(&self) -> Option<String> {
        let primary = self.city.as_ref().or(self.name.as_ref())?;
        let mut label = primary.clone();
        if let Some(state) = self.state.as_ref().filter(|s| *s != primary) {
            label.push_str(", ");
            label.push_str(state);
        }
        if let Some(country) = &self.country {
            label.push_str(", ");
            label.push_str(country);
        }
        Some(label)
    }
}

impl Feature {
    fn into_candidate(self) -> Option<PlaceCandidate> {
        if !self.properties.is_settlement() {
            return None;
        }
        let (longitude, latitude) = match self.geometry.coordinates.as_slice() {
            [lng, lat, ..] => (*lng, *lat),
            _ => return None,
        };
        let label = self.properties.label()?;
        let Properties { name, city, state, country, kind, .. } = self.properties;
        Some(PlaceCandidate {
            label,
            latitude,
            longitude,
            name,
            city,
            state,
            country,
            kind,
        })
    }
}

/// Candidates for `query`, or an empty list when the query is too short or
/// the geocoder cannot be used.
pub async fn search_places(
    client: &Client,
    base_url: &str,
    query: &str,
    limit: u32,
) -> Vec<PlaceCandidate> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }

    match fetch_places(client, base_url, query, limit).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!(
                query = %query,
                error = %e,
                "Place search failed, returning no candidates"
            );
            Vec::new()
        }
    }
}

async fn fetch_places(
    client: &Client,
    base_url: &str,
    query: &str,
    limit: u32,
) -> Result<Vec<PlaceCandidate>, ChartError> {
    let url = format!(
        "{}/api/?q={}&limit={}",
        base_url.trim_end_matches('/'),
        encode(query),
        limit
    );

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| ChartError::GeocodingUnavailable(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ChartError::GeocodingUnavailable(format!("HTTP {}", response.status())));
    }

    let collection: FeatureCollection = response
        .json()
        .await
        .map_err(|e| ChartError::GeocodingUnavailable(e.to_string()))?;

    let candidates: Vec<PlaceCandidate> = collection
        .features
        .into_iter()
        .filter_map(Feature::into_candidate)
        .collect();

    if candidates.is_empty() {
        tracing::debug!(query = %query, "Geocoder returned no settlements");
    }
    Ok(candidates)
}
