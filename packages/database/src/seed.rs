//! Synthetic crime dataset around a handful of US cities.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use rand::Rng;
use safeguard_crime_models::{CrimeSeverity, NewCrimeRecord, SEED_CRIME_TYPES};
use safeguard_geography_models::Coordinate;

/// Records generated per city when no range is given.
pub const DEFAULT_PER_CITY: RangeInclusive<usize> = 20..=49;

/// Maximum offset from a city center in each axis, in degrees.
const MAX_OFFSET_DEGREES: f64 = 0.05;

/// A city the seed data clusters around.
#[derive(Debug, Clone, Copy)]
pub struct SeedCity {
    /// City name, used in record descriptions.
    pub name: &'static str,
    /// City center latitude.
    pub latitude: f64,
    /// City center longitude.
    pub longitude: f64,
}

/// Cities the bundled dataset covers.
pub const SEED_CITIES: &[SeedCity] = &[
    SeedCity {
        name: "New York",
        latitude: 40.7128,
        longitude: -74.0060,
    },
    SeedCity {
        name: "Los Angeles",
        latitude: 34.0522,
        longitude: -118.2437,
    },
    SeedCity {
        name: "Chicago",
        latitude: 41.8781,
        longitude: -87.6298,
    },
    SeedCity {
        name: "Houston",
        latitude: 29.7604,
        longitude: -95.3698,
    },
    SeedCity {
        name: "Phoenix",
        latitude: 33.4484,
        longitude: -112.0740,
    },
];

/// Generates random crime records around every [`SEED_CITIES`] entry.
///
/// Each city gets a count drawn from `per_city`. Points are offset
/// uniformly by up to ±0.05° in each axis, with a uniform crime type from
/// [`SEED_CRIME_TYPES`] and a uniform severity. All records share
/// `reported_at`.
pub fn generate_crime_records<R: Rng + ?Sized>(
    rng: &mut R,
    per_city: RangeInclusive<usize>,
    reported_at: DateTime<Utc>,
) -> Vec<NewCrimeRecord> {
    let mut records = Vec::new();

    for city in SEED_CITIES {
        let count = rng.random_range(per_city.clone());

        for _ in 0..count {
            let latitude =
                city.latitude + rng.random_range(-MAX_OFFSET_DEGREES..=MAX_OFFSET_DEGREES);
            let longitude =
                city.longitude + rng.random_range(-MAX_OFFSET_DEGREES..=MAX_OFFSET_DEGREES);
            let crime_type = SEED_CRIME_TYPES[rng.random_range(0..SEED_CRIME_TYPES.len())];
            let severities = CrimeSeverity::all();
            let severity = severities[rng.random_range(0..severities.len())];

            records.push(NewCrimeRecord {
                location: Coordinate {
                    latitude,
                    longitude,
                },
                crime_type: crime_type.to_string(),
                severity,
                description: Some(format!("Crime incident in {} area", city.name)),
                reported_at,
            });
        }

        log::debug!("Generated {count} crimes for {}", city.name);
    }

    records
}
