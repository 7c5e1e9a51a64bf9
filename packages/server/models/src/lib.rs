#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the SafeGuard server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the service result types to allow independent evolution of the API
//! contract.

use safeguard_database_models::SosEvent;
use safeguard_geography_models::{Coordinate, InvalidCoordinateError};
use safeguard_places::SafePlace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `POST /api/sos/trigger`.
///
/// Coordinates are optional here so that a missing value is reported as a
/// validation error rather than a JSON parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Street address resolved by the client, if any.
    pub address: Option<String>,
}

/// Response from `POST /api/sos/trigger`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSosTriggerResponse {
    /// Always `true`; failures use the error body instead.
    pub success: bool,
    /// Delivery summary.
    pub message: String,
    /// The recorded event.
    pub event: SosEvent,
    /// Number of contacts the alert reached.
    pub contacts_notified: usize,
}

/// Error from reading a location out of query parameters.
#[derive(Debug, Error)]
pub enum LocationParamError {
    /// One or both parameters were absent or empty.
    #[error("Latitude and longitude are required")]
    Missing,
    /// A parameter was not a number.
    #[error("Latitude and longitude must be numbers")]
    NotANumber,
    /// A parameter was out of range.
    #[error("Invalid location: {0}")]
    OutOfRange(#[from] InvalidCoordinateError),
}

/// Query parameters for the location-based endpoints.
///
/// Values are taken as strings so that every malformed input maps onto a
/// [`LocationParamError`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationQueryParams {
    /// Latitude in degrees.
    pub latitude: Option<String>,
    /// Longitude in degrees.
    pub longitude: Option<String>,
}

impl LocationQueryParams {
    /// Parses and validates the coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`LocationParamError`] if either value is missing, blank,
    /// not a number, or out of range.
    pub fn coordinate(&self) -> Result<Coordinate, LocationParamError> {
        let latitude = non_blank(self.latitude.as_deref()).ok_or(LocationParamError::Missing)?;
        let longitude = non_blank(self.longitude.as_deref()).ok_or(LocationParamError::Missing)?;

        let latitude: f64 = latitude
            .parse()
            .map_err(|_| LocationParamError::NotANumber)?;
        let longitude: f64 = longitude
            .parse()
            .map_err(|_| LocationParamError::NotANumber)?;

        Ok(Coordinate::new(latitude, longitude)?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Body of `POST /api/contacts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactRequest {
    /// Contact's name.
    #[serde(default)]
    pub name: String,
    /// Phone number in international format.
    #[serde(default)]
    pub phone_number: String,
}

/// Response from `GET /api/safe-places`.
#[derive(Debug, Clone, Serialize)]
pub struct SafePlacesResponse {
    /// Places ordered nearest first.
    pub places: Vec<SafePlace>,
}

/// Generic success acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage {
    /// Always `true` for a success acknowledgement.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl ApiMessage {
    /// A successful acknowledgement carrying `message`.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Whether SMS credentials are configured.
    pub sms_configured: bool,
    /// Whether a places provider is configured.
    pub places_configured: bool,
    /// Whether an AI advisor is configured.
    pub advisor_configured: bool,
}
