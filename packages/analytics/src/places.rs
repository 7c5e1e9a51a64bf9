//! Safe place ranking across categories.

use std::sync::Arc;

use safeguard_geography::proximity::rank_by_distance;
use safeguard_geography_models::Coordinate;
use safeguard_places::{PlaceType, PlacesError, PlacesProvider, SafePlace};

use crate::SafetyAggregator;

impl SafetyAggregator {
    /// Nearest safe places around `center`, merged across `categories`.
    ///
    /// Each category is queried concurrently. A category keeps its
    /// `per_category_limit` nearest results; the merged list is sorted by
    /// distance and capped. A category whose lookup fails or times out is
    /// logged and contributes nothing. With no provider configured the
    /// result is empty.
    pub async fn nearby_places(
        &self,
        center: Coordinate,
        categories: &[PlaceType],
        radius_km: f64,
        per_category_limit: usize,
    ) -> Vec<SafePlace> {
        let Some(provider) = self.places.as_ref() else {
            log::warn!("No places provider configured, returning no safe places");
            return Vec::new();
        };

        let lookups = categories.iter().map(|&category| {
            let provider = Arc::clone(provider);
            async move {
                let result = match tokio::time::timeout(
                    self.timeout,
                    provider.nearby(center, category, radius_km),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(PlacesError::Status {
                        status: "TIMEOUT".to_string(),
                        message: format!("no response after {:?}", self.timeout),
                    }),
                };

                match result {
                    Ok(raw) => rank_by_distance(center, raw)
                        .into_iter()
                        .take(per_category_limit)
                        .map(|ranked| {
                            SafePlace::from_raw(ranked.record, category, ranked.distance_km)
                        })
                        .collect(),
                    Err(e) => {
                        log::warn!("Error fetching {category} places: {e}");
                        Vec::new()
                    }
                }
            }
        });

        let mut places: Vec<SafePlace> = futures::future::join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .collect();

        places.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        places.truncate(self.max_places);
        places
    }
}
