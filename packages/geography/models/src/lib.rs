#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate and bounding box types.
//!
//! A [`Coordinate`] has no identity of its own; it is always carried
//! alongside the entity it locates (an SOS event, a crime record, a safe
//! place). Range checking happens once at the system boundary via
//! [`Coordinate::new`]; geometry code downstream assumes valid input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by all great-circle computations, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of latitude, in kilometres.
const KM_PER_DEGREE_LAT: f64 = 111.32;

/// A WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
}

/// Error returned when a latitude or longitude is missing, not finite, or
/// out of range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidCoordinateError {
    /// Latitude was not supplied.
    #[error("latitude is required")]
    MissingLatitude,
    /// Longitude was not supplied.
    #[error("longitude is required")]
    MissingLongitude,
    /// Latitude is NaN, infinite, or outside `[-90, 90]`.
    #[error("invalid latitude {0}: expected -90 to 90")]
    Latitude(f64),
    /// Longitude is NaN, infinite, or outside `[-180, 180]`.
    #[error("invalid longitude {0}: expected -180 to 180")]
    Longitude(f64),
}

impl Coordinate {
    /// Creates a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either component is not a
    /// finite number within its WGS84 range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Creates a validated coordinate from optional components, as they
    /// arrive from request bodies and query strings.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either component is missing or
    /// invalid.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Self, InvalidCoordinateError> {
        let latitude = latitude.ok_or(InvalidCoordinateError::MissingLatitude)?;
        let longitude = longitude.ok_or(InvalidCoordinateError::MissingLongitude)?;
        Self::new(latitude, longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Returns a box guaranteed to contain every point within `radius_km`
    /// of `center`, padded by 10%.
    ///
    /// Returns `None` when the box would reach a pole or cross the
    /// antimeridian; callers fall back to an unfiltered scan in that case.
    #[must_use]
    pub fn around(center: Coordinate, radius_km: f64) -> Option<Self> {
        let padded = radius_km.max(0.0) * 1.1;
        let lat_delta = padded / KM_PER_DEGREE_LAT;

        let south = center.latitude - lat_delta;
        let north = center.latitude + lat_delta;
        if south <= -90.0 || north >= 90.0 {
            return None;
        }

        // The widest longitude span is at the latitude edge closest to a pole.
        let widest_lat = south.abs().max(north.abs()).to_radians();
        let lng_delta = padded / (KM_PER_DEGREE_LAT * widest_lat.cos());

        let west = center.longitude - lng_delta;
        let east = center.longitude + lng_delta;
        if west < -180.0 || east > 180.0 {
            return None;
        }

        Some(Self::new(west, south, east, north))
    }

    /// Whether the box contains the given coordinate (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }
}
