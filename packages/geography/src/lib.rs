#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle distance and radius queries over point data.
//!
//! [`distance_km`] is the Haversine formula on a sphere of radius
//! [`EARTH_RADIUS_KM`]. [`proximity::within_radius`] builds on it to select
//! and order records around a query point.

pub mod proximity;

pub use safeguard_geography_models::{Coordinate, EARTH_RADIUS_KM};

/// Great-circle distance between two coordinates in kilometres.
///
/// Symmetric, zero for identical points, and monotonic in the angular
/// separation. Inputs are assumed to be valid WGS84 coordinates.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push `h` a hair past 1 for antipodal points.
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn same_point_is_zero() {
        for (lat, lng) in [(0.0, 0.0), (40.7128, -74.006), (-33.8688, 151.2093), (90.0, 0.0)] {
            let p = coord(lat, lng);
            assert!(distance_km(p, p).abs() < 1e-9, "{p} not zero");
        }
    }

    #[test]
    fn symmetric() {
        let nyc = coord(40.7128, -74.006);
        let london = coord(51.5074, -0.1278);
        let sydney = coord(-33.8688, 151.2093);
        for (a, b) in [(nyc, london), (london, sydney), (sydney, nyc)] {
            assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn known_distances() {
        // NYC to London: ~5,570 km
        let d = distance_km(coord(40.7128, -74.006), coord(51.5074, -0.1278));
        assert!((d - 5570.0).abs() < 50.0, "got {d}");

        // One degree of latitude along a meridian: ~111.19 km
        let d = distance_km(coord(0.0, 0.0), coord(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = distance_km(coord(0.0, 0.0), coord(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn monotonic_in_separation() {
        let origin = coord(10.0, 10.0);
        let mut previous = 0.0;
        for step in 1..=20 {
            let d = distance_km(origin, coord(10.0 + f64::from(step) * 0.5, 10.0));
            assert!(d > previous);
            previous = d;
        }
    }
}
