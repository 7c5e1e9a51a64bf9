//! Compile-time embedded places service configuration.

use serde::Deserialize;

use crate::PlaceType;

/// Places service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesService {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Search endpoint URL.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Categories queried for a safe places request.
    pub categories: Vec<PlaceType>,
    /// Search radius in kilometres.
    pub search_radius_km: f64,
    /// Nearest results kept per category.
    pub per_category_limit: usize,
    /// Overall cap after merging categories.
    pub max_results: usize,
}

const GOOGLE_TOML: &str = include_str!("../services/google.toml");

/// Returns the Google Places service configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed.
#[must_use]
pub fn google_service() -> PlacesService {
    toml::de::from_str(GOOGLE_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse places service 'google': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_google_service() {
        let svc = google_service();
        assert_eq!(svc.id, "google_places");
        assert!(svc.base_url.starts_with("https://"));
        assert_eq!(svc.api_key_env, "GOOGLE_MAPS_API_KEY");
        assert_eq!(
            svc.categories,
            vec![PlaceType::Police, PlaceType::Hospital, PlaceType::FireStation]
        );
        assert!((svc.search_radius_km - 5.0).abs() < f64::EPSILON);
        assert_eq!(svc.per_category_limit, 5);
        assert_eq!(svc.max_results, 15);
    }
}
