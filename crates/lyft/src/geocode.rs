//! Street address lookup.

use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use lyft_client::Location;
use serde::Deserialize;

/// Google Maps Geocoding API endpoint.
pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Resolves a street address to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// The best match for `address`, or `None` when nothing matched.
    ///
    /// The returned address is the geocoder's cleaned-up form and may
    /// differ from the input.
    async fn geocode(&self, address: &str) -> Result<Option<Location>>;
}

/// Geocoder backed by the Google Maps Geocoding JSON API.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    http: reqwest::Client,
    key: String,
    endpoint: String,
}

impl GoogleGeocoder {
    pub fn new(http: reqwest::Client, key: impl Into<String>) -> Self {
        Self {
            http,
            key: key.into(),
            endpoint: GOOGLE_GEOCODE_URL.to_string(),
        }
    }

    /// Point at a different endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Location>> {
        let response: GeocodeResponse = self
            .http
            .get(self.endpoint.as_str())
            .query(&[("address", address), ("key", self.key.as_str())])
            .send()
            .await
            .context("Geocode request failed")?
            .error_for_status()
            .context("Geocode request failed")?
            .json()
            .await
            .context("Failed to decode geocode response")?;

        match response.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Ok(None),
            status => bail!(
                "geocode failed: {status}{}",
                response
                    .error_message
                    .map(|m| format!(": {m}"))
                    .unwrap_or_default()
            ),
        }

        Ok(response.results.into_iter().next().map(|r| {
            let location = Location::new(r.geometry.location.lat, r.geometry.location.lng);
            if r.formatted_address.is_empty() {
                location
            } else {
                location.with_address(r.formatted_address)
            }
        }))
    }
}

/// Parse `"lat,lng"` without touching the network.
pub fn parse_lat_lng(input: &str) -> Option<Location> {
    let (lat, lng) = input.split_once(',')?;
    if lng.contains(',') {
        return None;
    }
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    (lat.is_finite() && lng.is_finite()).then(|| Location::new(lat, lng))
}

/// Interpret user input as a `lat,lng` pair or a street address.
///
/// `geocoder` is only called when the input is not a coordinate pair.
pub async fn parse_location_input<G, F>(input: &str, geocoder: F) -> Result<Location>
where
    G: Geocoder,
    F: FnOnce() -> Result<G>,
{
    let input = input.trim();
    if input.is_empty() {
        bail!("no location entered");
    }
    if let Some(location) = parse_lat_lng(input) {
        return Ok(location);
    }

    let geocoder = geocoder()?;
    geocoder
        .geocode(input)
        .await
        .with_context(|| format!("failed to determine coordinates for address {input:?}"))?
        .ok_or_else(|| anyhow::anyhow!("no results for address {input:?}"))
}

/// A Google Maps link for a point.
pub fn google_maps_url(lat: f64, lng: f64) -> String {
    format!("https://www.google.com/maps/place/{lat:.6},{lng:.6}")
}
