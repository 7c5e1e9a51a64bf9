#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Nearby police, hospital and fire station lookup.
//!
//! A [`PlacesProvider`] answers one category at a time and returns raw
//! places in whatever order the upstream API uses. Ranking, distance
//! computation and merging across categories happen in
//! `safeguard_analytics`.
//!
//! The Google provider's endpoint and request parameters live in
//! `services/google.toml`, embedded at compile time (see [`service`]).

pub mod google;
pub mod service;

use async_trait::async_trait;
use safeguard_geography::proximity::Located;
use safeguard_geography_models::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Kind of safe place.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaceType {
    /// Police station.
    Police,
    /// Hospital.
    Hospital,
    /// Fire station.
    FireStation,
}

impl PlaceType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Police, Self::Hospital, Self::FireStation]
    }
}

/// A place as returned by a provider, before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlace {
    /// Provider's place id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short address, if the provider has one.
    pub address: Option<String>,
    /// Where the place is.
    pub location: Coordinate,
}

impl Located for RawPlace {
    fn coordinate(&self) -> Coordinate {
        self.location
    }
}

/// A ranked safe place near a query point. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafePlace {
    /// Provider's place id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Which category the place was found under.
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    /// Short address, if known.
    pub address: Option<String>,
    /// Where the place is.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Great-circle distance from the query point, in kilometres.
    pub distance_km: f64,
}

impl SafePlace {
    /// Builds a ranked place from a raw provider result.
    #[must_use]
    pub fn from_raw(raw: RawPlace, place_type: PlaceType, distance_km: f64) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            place_type,
            address: raw.address,
            location: raw.location,
            distance_km,
        }
    }
}

/// Errors from a places lookup.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// The provider is missing required configuration (e.g. an API key).
    #[error("Places provider not configured: {0}")]
    Configuration(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider answered with an error status.
    #[error("Provider returned {status}: {message}")]
    Status {
        /// Provider status code or label.
        status: String,
        /// Provider's error description.
        message: String,
    },
}

/// Source of nearby places for one category.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Returns places of `category` within roughly `radius_km` of `center`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the lookup fails.
    async fn nearby(
        &self,
        center: Coordinate,
        category: PlaceType,
        radius_km: f64,
    ) -> Result<Vec<RawPlace>, PlacesError>;
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn place_type_names() {
        assert_eq!(PlaceType::FireStation.as_ref(), "fire_station");
        assert_eq!(PlaceType::from_str("police"), Ok(PlaceType::Police));
        assert_eq!(
            serde_json::to_string(&PlaceType::Hospital).unwrap(),
            "\"hospital\""
        );
    }

    #[test]
    fn safe_place_json_shape() {
        let place = SafePlace::from_raw(
            RawPlace {
                id: "p1".to_string(),
                name: "Precinct 1".to_string(),
                address: Some("16 Ericsson Pl".to_string()),
                location: Coordinate::new(40.72, -74.007).unwrap(),
            },
            PlaceType::Police,
            0.81,
        );

        let json = serde_json::to_value(&place).unwrap();
        assert_eq!(json["type"], "police");
        assert_eq!(json["latitude"], 40.72);
        assert_eq!(json["distanceKm"], 0.81);
        assert_eq!(json["address"], "16 Ericsson Pl");
    }
}
