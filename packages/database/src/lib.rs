#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Persistence for users, sessions, emergency contacts, the SOS event log
//! and the crime dataset.
//!
//! [`queries::DbStore`] implements every store trait from
//! `safeguard_database_models` on top of `SQLite` via `switchy_database`.
//! [`memory::MemoryStore`] implements the same traits in process memory
//! for tests and throwaway servers. [`seed`] generates the bundled crime
//! dataset.

pub mod db;
pub mod memory;
pub mod queries;
pub mod seed;

pub use db::{DEFAULT_DB_PATH, open_db};
pub use memory::MemoryStore;
pub use queries::DbStore;

use chrono::{DateTime, SecondsFormat, Utc};
use safeguard_database_models::StoreError;

/// Formats a timestamp the way every table stores it.
///
/// Fixed-width RFC 3339 with microseconds, so lexicographic order matches
/// chronological order.
#[must_use]
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp written by [`format_timestamp`].
///
/// # Errors
///
/// Returns [`StoreError::Conversion`] if the text is not RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| StoreError::Conversion {
            message: format!("Invalid timestamp '{value}': {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_roundtrip_and_sort() {
        let earlier = DateTime::parse_from_rfc3339("2024-03-01T09:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let a = format_timestamp(earlier);
        let b = format_timestamp(later);
        assert!(a < b);
        assert_eq!(a.len(), b.len());
        assert_eq!(parse_timestamp(&a).unwrap(), earlier);
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(StoreError::Conversion { .. })
        ));
    }
}
