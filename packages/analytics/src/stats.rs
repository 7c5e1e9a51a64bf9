//! Pure summarisation of crimes already filtered by radius.

use safeguard_crime_models::{CrimeRecord, CrimeStats, CrimeTypeCount, SafetyLevel};
use safeguard_geography::proximity::Ranked;

/// Crime count and exact mean severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeveritySummary {
    /// Number of crimes.
    pub crime_count: u64,
    /// Mean severity, `0.0` when there are no crimes.
    pub average_severity: f64,
}

impl SeveritySummary {
    /// Summarises `crimes`.
    #[must_use]
    pub fn from_crimes(crimes: &[Ranked<CrimeRecord>]) -> Self {
        let crime_count = crimes.len() as u64;
        let total: u64 = crimes
            .iter()
            .map(|c| u64::from(c.record.severity.value()))
            .sum();

        #[allow(clippy::cast_precision_loss)]
        let average_severity = if crime_count == 0 {
            0.0
        } else {
            total as f64 / crime_count as f64
        };

        Self {
            crime_count,
            average_severity,
        }
    }
}

/// Rounds to one decimal place.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Builds [`CrimeStats`] for crimes already inside the query radius.
///
/// Types are listed in order of first occurrence in `crimes`.
#[must_use]
pub fn summarize(crimes: &[Ranked<CrimeRecord>]) -> CrimeStats {
    let summary = SeveritySummary::from_crimes(crimes);

    let mut crimes_by_type: Vec<CrimeTypeCount> = Vec::new();
    for crime in crimes {
        let crime_type = &crime.record.crime_type;
        if let Some(entry) = crimes_by_type
            .iter_mut()
            .find(|entry| &entry.crime_type == crime_type)
        {
            entry.count += 1;
        } else {
            crimes_by_type.push(CrimeTypeCount {
                crime_type: crime_type.clone(),
                count: 1,
            });
        }
    }

    CrimeStats {
        total_crimes: summary.crime_count,
        severity: round_one_decimal(summary.average_severity),
        safety_level: SafetyLevel::from_crime_count(crimes.len()),
        trend: CrimeStats::STABLE_TREND.to_string(),
        crimes_by_type,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use safeguard_crime_models::CrimeSeverity;
    use safeguard_geography_models::Coordinate;

    use super::*;

    fn ranked(crime_type: &str, severity: u8) -> Ranked<CrimeRecord> {
        Ranked {
            record: CrimeRecord {
                id: format!("{crime_type}-{severity}"),
                location: Coordinate::new(0.0, 0.0).unwrap(),
                crime_type: crime_type.to_string(),
                severity: CrimeSeverity::from_value(severity).unwrap(),
                description: None,
                reported_at: Utc::now(),
            },
            distance_km: 0.0,
        }
    }

    fn many(count: usize) -> Vec<Ranked<CrimeRecord>> {
        (0..count).map(|_| ranked("theft", 2)).collect()
    }

    #[test]
    fn empty_area_is_safe_with_zero_severity() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_crimes, 0);
        assert!(stats.severity.abs() < f64::EPSILON);
        assert_eq!(stats.safety_level, SafetyLevel::Safe);
        assert_eq!(stats.trend, "Stable");
        assert!(stats.crimes_by_type.is_empty());
    }

    #[test]
    fn safety_level_thresholds() {
        assert_eq!(summarize(&many(8)).safety_level, SafetyLevel::Safe);
        assert_eq!(summarize(&many(9)).safety_level, SafetyLevel::Moderate);
        assert_eq!(summarize(&many(15)).safety_level, SafetyLevel::Moderate);
        assert_eq!(summarize(&many(16)).safety_level, SafetyLevel::Risky);
    }

    #[test]
    fn severity_is_rounded_to_one_decimal() {
        // (1 + 2 + 2) / 3 = 1.666...
        let stats = summarize(&[ranked("theft", 1), ranked("theft", 2), ranked("assault", 2)]);
        assert!((stats.severity - 1.7).abs() < 1e-9);

        let summary =
            SeveritySummary::from_crimes(&[ranked("theft", 1), ranked("theft", 2), ranked("assault", 2)]);
        assert!((summary.average_severity - 5.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn types_counted_in_first_occurrence_order() {
        let stats = summarize(&[
            ranked("robbery", 4),
            ranked("theft", 1),
            ranked("robbery", 5),
            ranked("vandalism", 2),
            ranked("theft", 2),
        ]);

        let counts: Vec<(&str, u64)> = stats
            .crimes_by_type
            .iter()
            .map(|c| (c.crime_type.as_str(), c.count))
            .collect();
        assert_eq!(counts, vec![("robbery", 2), ("theft", 2), ("vandalism", 1)]);
    }
}
