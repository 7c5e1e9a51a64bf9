#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime record, severity and area statistics types.
//!
//! Crime records are a shared reference dataset: they are batch-seeded,
//! never owned by a user, and immutable after creation. The statistics
//! types here are the output of the area aggregation in
//! `safeguard_analytics`.

use chrono::{DateTime, Utc};
use safeguard_geography::proximity::Located;
use safeguard_geography_models::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Severity level for a crime, from 1 (minimal) to 5 (critical).
///
/// Serialized as its bare integer value.
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
#[serde(try_from = "u8", into = "u8")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CrimeSeverity {
    /// Level 1: Non-criminal or minor offenses
    Minimal = 1,
    /// Level 2: Low-level offenses (petty theft, trespassing)
    Low = 2,
    /// Level 3: Moderate offenses (burglary, vandalism)
    Moderate = 3,
    /// Level 4: Serious offenses (robbery, aggravated assault)
    High = 4,
    /// Level 5: Most severe offenses
    Critical = 5,
}

impl CrimeSeverity {
    /// Returns the numeric value of this severity level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a severity level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: u8) -> Result<Self, InvalidSeverityError> {
        match value {
            1 => Ok(Self::Minimal),
            2 => Ok(Self::Low),
            3 => Ok(Self::Moderate),
            4 => Ok(Self::High),
            5 => Ok(Self::Critical),
            _ => Err(InvalidSeverityError { value }),
        }
    }

    /// Returns all variants in ascending order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minimal,
            Self::Low,
            Self::Moderate,
            Self::High,
            Self::Critical,
        ]
    }
}

impl TryFrom<u8> for CrimeSeverity {
    type Error = InvalidSeverityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<CrimeSeverity> for u8 {
    fn from(value: CrimeSeverity) -> Self {
        value.value()
    }
}

/// Error returned when attempting to create a [`CrimeSeverity`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid severity value {value}: expected 1-5")]
pub struct InvalidSeverityError {
    /// The invalid severity value that was provided.
    pub value: u8,
}

/// Crime types produced by the seed generator.
///
/// The stored `crime_type` column is an open string; these are the values
/// the bundled dataset uses.
pub const SEED_CRIME_TYPES: &[&str] = &["theft", "assault", "burglary", "vandalism", "robbery"];

/// A single reported crime incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeRecord {
    /// Unique identifier.
    pub id: String,
    /// Where the incident happened.
    #[serde(flatten)]
    pub location: Coordinate,
    /// Free-form category such as `theft` or `assault`.
    pub crime_type: String,
    /// Severity on the 1-5 scale.
    pub severity: CrimeSeverity,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// When the incident was reported.
    pub reported_at: DateTime<Utc>,
}

impl Located for CrimeRecord {
    fn coordinate(&self) -> Coordinate {
        self.location
    }
}

/// A crime record that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCrimeRecord {
    /// Where the incident happened.
    pub location: Coordinate,
    /// Free-form category such as `theft` or `assault`.
    pub crime_type: String,
    /// Severity on the 1-5 scale.
    pub severity: CrimeSeverity,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// When the incident was reported.
    pub reported_at: DateTime<Utc>,
}

/// Categorical safety label for an area.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SafetyLevel {
    /// Few incidents nearby.
    Safe,
    /// Some incidents nearby.
    Moderate,
    /// Many incidents nearby.
    Risky,
}

impl SafetyLevel {
    /// Classifies an area by raw incident count.
    ///
    /// More than 15 incidents is `Risky`, more than 8 is `Moderate`,
    /// anything else is `Safe`. Severity does not factor in.
    #[must_use]
    pub const fn from_crime_count(total_crimes: usize) -> Self {
        if total_crimes > 15 {
            Self::Risky
        } else if total_crimes > 8 {
            Self::Moderate
        } else {
            Self::Safe
        }
    }

    /// Classifies an area by a 1-10 risk score.
    ///
    /// 7 and above is `Risky`, 4 and above is `Moderate`.
    #[must_use]
    pub const fn from_risk_score(risk_score: u8) -> Self {
        if risk_score >= 7 {
            Self::Risky
        } else if risk_score >= 4 {
            Self::Moderate
        } else {
            Self::Safe
        }
    }
}

/// Number of incidents of a single crime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrimeTypeCount {
    /// The crime type.
    #[serde(rename = "type")]
    pub crime_type: String,
    /// How many incidents of that type.
    pub count: u64,
}

/// Aggregated crime statistics around a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeStats {
    /// Number of incidents inside the radius.
    pub total_crimes: u64,
    /// Mean severity rounded to one decimal place, `0.0` when empty.
    pub severity: f64,
    /// Count-based safety classification.
    pub safety_level: SafetyLevel,
    /// Trend label. Always [`CrimeStats::STABLE_TREND`] for now.
    pub trend: String,
    /// Per-type counts in order of first occurrence.
    pub crimes_by_type: Vec<CrimeTypeCount>,
}

impl CrimeStats {
    /// Trend reported for every area until historical deltas are tracked.
    pub const STABLE_TREND: &'static str = "Stable";
}
