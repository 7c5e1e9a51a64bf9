//! Google Places Nearby Search provider.
//!
//! See <https://developers.google.com/maps/documentation/places/web-service/search-nearby>

use async_trait::async_trait;
use safeguard_geography_models::Coordinate;
use serde::Deserialize;

use crate::service::{PlacesService, google_service};
use crate::{PlaceType, PlacesError, PlacesProvider, RawPlace};

/// [`PlacesProvider`] backed by the Google Places legacy Nearby Search API.
pub struct GooglePlacesProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GooglePlacesProvider {
    /// Creates a provider for `base_url` authenticated with `api_key`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Creates a provider from the embedded service config and the API key
    /// environment variable it names.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Configuration`] if the key is not set.
    pub fn from_env() -> Result<Self, PlacesError> {
        Self::from_service(&google_service())
    }

    /// Creates a provider from `service`, reading the API key from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Configuration`] if the key is not set.
    pub fn from_service(service: &PlacesService) -> Result<Self, PlacesError> {
        let api_key = std::env::var(&service.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PlacesError::Configuration(format!("{} is not set", service.api_key_env))
            })?;
        Ok(Self::new(service.base_url.clone(), api_key))
    }
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    vicinity: Option<String>,
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
impl PlacesProvider for GooglePlacesProvider {
    async fn nearby(
        &self,
        center: Coordinate,
        category: PlaceType,
        radius_km: f64,
    ) -> Result<Vec<RawPlace>, PlacesError> {
        let location = format!("{},{}", center.latitude, center.longitude);
        let radius_m = radius_meters(radius_km);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius_m.as_str()),
                ("type", category.as_ref()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(redact_url)?;

        let body = resp.text().await.map_err(redact_url)?;
        parse_response(&body)
    }
}

/// The request URL carries the API key, so it never reaches the error.
fn redact_url(e: reqwest::Error) -> PlacesError {
    PlacesError::Http(e.without_url())
}

/// Search radius in whole metres, as the API expects. Google caps the
/// radius at 50 km.
fn radius_meters(radius_km: f64) -> String {
    let meters = (radius_km * 1000.0).round().clamp(1.0, 50_000.0);
    format!("{meters:.0}")
}

fn parse_response(body: &str) -> Result<Vec<RawPlace>, PlacesError> {
    let response: NearbySearchResponse =
        serde_json::from_str(body).map_err(|e| PlacesError::Parse {
            message: format!("Invalid Nearby Search response: {e}"),
        })?;

    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => {}
        _ => {
            return Err(PlacesError::Status {
                status: response.status,
                message: response.error_message.unwrap_or_default(),
            });
        }
    }

    Ok(response
        .results
        .into_iter()
        .filter_map(|place| {
            match Coordinate::new(place.geometry.location.lat, place.geometry.location.lng) {
                Ok(location) => Some(RawPlace {
                    id: place.place_id,
                    name: place.name,
                    address: place.vicinity,
                    location,
                }),
                Err(e) => {
                    log::debug!("Skipping place {} with bad location: {e}", place.place_id);
                    None
                }
            }
        })
        .collect())
}
