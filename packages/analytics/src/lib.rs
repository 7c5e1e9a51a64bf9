#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime statistics and safe place ranking around a location.
//!
//! [`SafetyAggregator`] pulls candidate crimes from a `CrimeStore`, applies
//! the exact radius test from `safeguard_geography`, and summarises the
//! result. It also queries a places provider per category and merges the
//! categories into one distance-ordered list.

pub mod places;
pub mod stats;

use std::sync::Arc;
use std::time::Duration;

use safeguard_crime_models::{CrimeRecord, CrimeStats};
use safeguard_database_models::{CrimeStore, StoreError};
use safeguard_geography::proximity::{Ranked, within_radius};
use safeguard_geography_models::Coordinate;
use safeguard_places::PlacesProvider;
use thiserror::Error;

pub use stats::SeveritySummary;

/// Radius used for crime statistics and insights, in kilometres.
pub const CRIME_RADIUS_KM: f64 = 5.0;

/// Overall cap on merged safe place results.
pub const MAX_SAFE_PLACES: usize = 15;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The crime dataset could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Computes crime statistics and safe place rankings.
#[derive(Clone)]
pub struct SafetyAggregator {
    crimes: Arc<dyn CrimeStore>,
    places: Option<Arc<dyn PlacesProvider>>,
    timeout: Duration,
    max_places: usize,
}

impl SafetyAggregator {
    /// Creates an aggregator. `places` is `None` when no provider is
    /// configured; `timeout` bounds each provider call.
    #[must_use]
    pub fn new(
        crimes: Arc<dyn CrimeStore>,
        places: Option<Arc<dyn PlacesProvider>>,
        timeout: Duration,
    ) -> Self {
        Self {
            crimes,
            places,
            timeout,
            max_places: MAX_SAFE_PLACES,
        }
    }

    /// Overrides the overall cap on merged safe places.
    #[must_use]
    pub fn with_max_places(mut self, max_places: usize) -> Self {
        self.max_places = max_places;
        self
    }

    /// Crimes within `radius_km` of `center`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the crime store fails. There are no
    /// partial results.
    pub async fn nearby_crimes(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<Ranked<CrimeRecord>>, AnalyticsError> {
        let candidates = self.crimes.query_near(center, radius_km).await?;
        let candidate_count = candidates.len();
        let matches = within_radius(center, radius_km, candidates);

        log::debug!(
            "{} of {candidate_count} candidate crimes within {radius_km} km of {center}",
            matches.len()
        );

        Ok(matches)
    }

    /// Crime statistics within `radius_km` of `center`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the crime store fails.
    pub async fn stats(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<CrimeStats, AnalyticsError> {
        let crimes = self.nearby_crimes(center, radius_km).await?;
        Ok(stats::summarize(&crimes))
    }

    /// Unrounded crime count and mean severity within `radius_km` of
    /// `center`, the inputs to a safety insight.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the crime store fails.
    pub async fn severity_summary(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<SeveritySummary, AnalyticsError> {
        let crimes = self.nearby_crimes(center, radius_km).await?;
        Ok(SeveritySummary::from_crimes(&crimes))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use safeguard_crime_models::{CrimeSeverity, NewCrimeRecord, SafetyLevel};
    use safeguard_database::MemoryStore;

    use super::*;

    struct UnavailableStore;

    #[async_trait]
    impl CrimeStore for UnavailableStore {
        async fn query_all(&self) -> Result<Vec<CrimeRecord>, StoreError> {
            Err(StoreError::Database("connection refused".to_string()))
        }

        async fn insert_many(&self, _records: &[NewCrimeRecord]) -> Result<u64, StoreError> {
            Err(StoreError::Database("connection refused".to_string()))
        }
    }

    fn crime(lat: f64, lng: f64, crime_type: &str, severity: CrimeSeverity) -> NewCrimeRecord {
        NewCrimeRecord {
            location: Coordinate::new(lat, lng).unwrap(),
            crime_type: crime_type.to_string(),
            severity,
            description: None,
            reported_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn stats_only_count_crimes_inside_radius() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_many(&[
                crime(40.7128, -74.006, "theft", CrimeSeverity::Low),
                crime(40.73, -74.0, "assault", CrimeSeverity::High),
                // Los Angeles, far outside the radius
                crime(34.0522, -118.2437, "robbery", CrimeSeverity::Critical),
            ])
            .await
            .unwrap();

        let agg = SafetyAggregator::new(store, None, Duration::from_secs(1));
        let center = Coordinate::new(40.7128, -74.006).unwrap();

        let stats = agg.stats(center, CRIME_RADIUS_KM).await.unwrap();
        assert_eq!(stats.total_crimes, 2);
        assert!((stats.severity - 3.0).abs() < 1e-9);
        assert_eq!(stats.safety_level, SafetyLevel::Safe);
        assert_eq!(stats.crimes_by_type.len(), 2);

        let nearby = agg.nearby_crimes(center, CRIME_RADIUS_KM).await.unwrap();
        assert_eq!(nearby[0].record.crime_type, "theft");
        assert!(nearby.iter().all(|c| c.distance_km <= CRIME_RADIUS_KM));
    }

    #[tokio::test]
    async fn unavailable_store_fails_the_whole_query() {
        let agg = SafetyAggregator::new(Arc::new(UnavailableStore), None, Duration::from_secs(1));
        let center = Coordinate::new(0.0, 0.0).unwrap();

        assert!(matches!(
            agg.stats(center, CRIME_RADIUS_KM).await,
            Err(AnalyticsError::Store(_))
        ));
        assert!(agg.severity_summary(center, CRIME_RADIUS_KM).await.is_err());
    }
}
