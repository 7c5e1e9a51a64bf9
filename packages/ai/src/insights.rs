//! Safety insights for a location.
//!
//! [`InsightAdapter::analyze`] never fails. Whenever the advisor is
//! missing, errors, times out, or replies with something that does not
//! pass [`validate_response`], the result comes from
//! [`fallback_insight`], which depends only on the crime numbers.

use std::{sync::Arc, time::Duration};

use safeguard_crime_models::SafetyLevel;
use safeguard_geography_models::Coordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::advisor::Advisor;

/// Generic tips returned by the fallback.
pub const FALLBACK_SUGGESTIONS: [&str; 5] = [
    "Stay aware of your surroundings at all times",
    "Travel in groups when possible, especially at night",
    "Keep emergency contacts readily accessible",
    "Trust your instincts and avoid situations that feel unsafe",
    "Use well-lit and populated routes",
];

const MIN_SUGGESTIONS: usize = 3;
const MAX_SUGGESTIONS: usize = 5;

/// Risk summary for an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyInsight {
    /// 1 (safest) to 10 (most dangerous). The fallback may yield 0 for an
    /// area with no recorded incidents.
    pub risk_score: u8,
    /// Label derived from the risk score.
    pub safety_level: SafetyLevel,
    /// Three to five practical tips.
    pub suggestions: Vec<String>,
    /// Short prose summary.
    pub area_analysis: String,
}

/// Why an advisor reply was not accepted.
#[derive(Debug, Error)]
pub enum InsightRejection {
    /// The reply is not JSON of the expected shape.
    #[error("Reply is not a valid insight object: {0}")]
    Malformed(#[from] serde_json::Error),
    /// `riskScore` rounds to a value outside 1-10.
    #[error("riskScore {0} is outside 1-10")]
    RiskScoreOutOfRange(f64),
    /// `safetyLevel` is not `Safe`, `Moderate` or `Risky`.
    #[error("Unknown safetyLevel \"{0}\"")]
    UnknownSafetyLevel(String),
    /// Fewer than three or more than five suggestions.
    #[error("Expected 3-5 suggestions, got {0}")]
    SuggestionCount(usize),
    /// The suggestion at this index is empty after trimming.
    #[error("Suggestion {0} is blank")]
    BlankSuggestion(usize),
    /// `areaAnalysis` is empty after trimming.
    #[error("areaAnalysis is blank")]
    BlankAreaAnalysis,
}

/// Shape the advisor is asked to reply with, before range checks.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvisorReply {
    risk_score: f64,
    safety_level: String,
    suggestions: Vec<String>,
    area_analysis: String,
}

/// Builds the advisor prompt for a location.
#[must_use]
pub fn build_prompt(center: Coordinate, crime_count: u64, average_severity: f64) -> String {
    format!(
        "Analyze the following location and provide safety insights:

Location: {latitude}, {longitude}
Nearby crimes reported: {crime_count}
Average crime severity: {average_severity}/5

Provide a JSON response with:
1. riskScore (1-10, where 1 is safest and 10 is most dangerous)
2. safetyLevel (one of: \"Safe\", \"Moderate\", \"Risky\")
3. suggestions (array of 3-5 practical safety tips for this area)
4. areaAnalysis (2-3 sentence summary of the area's safety profile)

Consider factors like crime density, severity, and general urban safety principles.",
        latitude = center.latitude,
        longitude = center.longitude,
    )
}

/// Removes a surrounding markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses and checks an advisor reply.
///
/// # Errors
///
/// Returns the first [`InsightRejection`] the reply runs into.
pub fn validate_response(raw: &str) -> Result<SafetyInsight, InsightRejection> {
    let reply: AdvisorReply = serde_json::from_str(strip_code_fence(raw))?;

    if !reply.risk_score.is_finite() || !(1.0..=10.0).contains(&reply.risk_score) {
        return Err(InsightRejection::RiskScoreOutOfRange(reply.risk_score));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let risk_score = reply.risk_score.round() as u8;

    let safety_level: SafetyLevel = reply
        .safety_level
        .trim()
        .parse()
        .map_err(|_| InsightRejection::UnknownSafetyLevel(reply.safety_level.clone()))?;

    if !(MIN_SUGGESTIONS..=MAX_SUGGESTIONS).contains(&reply.suggestions.len()) {
        return Err(InsightRejection::SuggestionCount(reply.suggestions.len()));
    }
    let mut suggestions = Vec::with_capacity(reply.suggestions.len());
    for (index, suggestion) in reply.suggestions.iter().enumerate() {
        let suggestion = suggestion.trim();
        if suggestion.is_empty() {
            return Err(InsightRejection::BlankSuggestion(index));
        }
        suggestions.push(suggestion.to_string());
    }

    let area_analysis = reply.area_analysis.trim();
    if area_analysis.is_empty() {
        return Err(InsightRejection::BlankAreaAnalysis);
    }

    Ok(SafetyInsight {
        risk_score,
        safety_level,
        suggestions,
        area_analysis: area_analysis.to_string(),
    })
}

/// Deterministic insight derived from the crime numbers alone.
///
/// `riskScore = min(10, round(crime_count / 5 + average_severity))`.
#[must_use]
pub fn fallback_insight(crime_count: u64, average_severity: f64) -> SafetyInsight {
    #[allow(clippy::cast_precision_loss)]
    let raw = (crime_count as f64 / 5.0 + average_severity).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let risk_score = if raw.is_nan() {
        0
    } else {
        raw.clamp(0.0, 10.0) as u8
    };
    let safety_level = SafetyLevel::from_risk_score(risk_score);

    let outlook = match safety_level {
        SafetyLevel::Risky => "Exercise extra caution and consider alternative routes.",
        SafetyLevel::Moderate => "Stay vigilant and follow basic safety precautions.",
        SafetyLevel::Safe => {
            "Area appears relatively safe, but always maintain situational awareness."
        }
    };

    SafetyInsight {
        risk_score,
        safety_level,
        suggestions: FALLBACK_SUGGESTIONS.iter().map(ToString::to_string).collect(),
        area_analysis: format!(
            "Based on {crime_count} reported incidents with average severity of \
             {average_severity:.1}/5, this area shows {level} crime activity. {outlook}",
            level = safety_level.as_ref().to_lowercase(),
        ),
    }
}

/// Wraps an optional [`Advisor`] and guarantees an insight.
pub struct InsightAdapter {
    advisor: Option<Arc<dyn Advisor>>,
    timeout: Duration,
}

impl InsightAdapter {
    /// Creates an adapter that waits at most `timeout` for `advisor`.
    #[must_use]
    pub fn new(advisor: Option<Arc<dyn Advisor>>, timeout: Duration) -> Self {
        Self { advisor, timeout }
    }

    /// Whether an advisor is configured.
    #[must_use]
    pub const fn has_advisor(&self) -> bool {
        self.advisor.is_some()
    }

    /// Produces a safety insight for `center`.
    pub async fn analyze(
        &self,
        center: Coordinate,
        crime_count: u64,
        average_severity: f64,
    ) -> SafetyInsight {
        let Some(advisor) = &self.advisor else {
            log::debug!("No advisor configured, using fallback insight");
            return fallback_insight(crime_count, average_severity);
        };

        let prompt = build_prompt(center, crime_count, average_severity);

        let raw = match tokio::time::timeout(self.timeout, advisor.generate(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                log::error!("Advisor request failed: {e}");
                return fallback_insight(crime_count, average_severity);
            }
            Err(_) => {
                log::warn!("Advisor timed out after {:?}", self.timeout);
                return fallback_insight(crime_count, average_severity);
            }
        };

        match validate_response(&raw) {
            Ok(insight) => insight,
            Err(rejection) => {
                log::warn!("Rejected advisor reply: {rejection}");
                fallback_insight(crime_count, average_severity)
            }
        }
    }
}
