//! Radius queries over point datasets.
//!
//! The current implementation is a linear Haversine scan, which is fine at
//! seed-data scale. A spatial index can replace the internals as long as
//! the contract holds: every returned record lies at distance
//! `<= radius_km` (inclusive), results are sorted ascending by distance,
//! and ties keep input order.

use safeguard_geography_models::Coordinate;

use crate::distance_km;

/// Anything that has a location on the globe.
pub trait Located {
    /// The record's coordinate.
    fn coordinate(&self) -> Coordinate;
}

impl Located for Coordinate {
    fn coordinate(&self) -> Coordinate {
        *self
    }
}

/// A record paired with its distance from the query point.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    /// The matching record.
    pub record: T,
    /// Great-circle distance from the query center, in kilometres.
    pub distance_km: f64,
}

/// Returns every record within `radius_km` of `center`, nearest first.
///
/// Records exactly on the radius are included. Equal distances keep their
/// relative input order.
#[must_use]
pub fn within_radius<T, I>(center: Coordinate, radius_km: f64, dataset: I) -> Vec<Ranked<T>>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    let mut matches: Vec<Ranked<T>> = dataset
        .into_iter()
        .filter_map(|record| {
            let distance_km = distance_km(center, record.coordinate());
            (distance_km <= radius_km).then_some(Ranked {
                record,
                distance_km,
            })
        })
        .collect();

    // `sort_by` is stable, which gives the input-order tie break.
    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    matches
}

/// Ranks every record by distance from `center` without a radius cut-off.
#[must_use]
pub fn rank_by_distance<T, I>(center: Coordinate, dataset: I) -> Vec<Ranked<T>>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    within_radius(center, f64::INFINITY, dataset)
}
