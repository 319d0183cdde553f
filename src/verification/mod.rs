//! Freshness evaluation ("reflect")
//!
//! Recency gate over accumulated evidence: is there at least one data point
//! recent enough to answer from? Internal consistency is not checked.

use crate::error::OrchestrationError;
use crate::models::{ConfidenceVerdict, EvidenceSet};
use crate::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use tracing::{debug, info};

pub const NO_TIMESTAMP_SCORE: f64 = 0.4;
pub const STALE_SCORE: f64 = 0.5;
pub const FRESH_SCORE: f64 = 0.9;

pub const DEFAULT_FRESHNESS_WINDOW_DAYS: i64 = 3;

pub struct FreshnessEvaluator {
    window: Duration,
}

impl FreshnessEvaluator {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Window of `days` days. Negative or out-of-range values are rejected.
    pub fn with_window_days(days: i64) -> Result<Self> {
        if days < 0 {
            return Err(OrchestrationError::ConfigError(format!(
                "freshness window cannot be negative: {} days",
                days
            )));
        }
        let window = TimeDelta::try_days(days).ok_or_else(|| {
            OrchestrationError::ConfigError(format!("freshness window out of range: {} days", days))
        })?;
        Ok(Self::new(window))
    }

    /// Score the evidence against `now`. Recomputed from scratch on every call.
    pub fn evaluate(&self, evidence: &EvidenceSet, now: DateTime<Utc>) -> ConfidenceVerdict {
        let freshest = evidence
            .iter()
            .filter_map(|item| {
                let raw = item.last_updated()?;
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    debug!(last_updated = %raw, "Skipping unparsable timestamp");
                }
                parsed
            })
            .max();

        let verdict = match freshest {
            None => ConfidenceVerdict {
                score: NO_TIMESTAMP_SCORE,
                accepted: false,
            },
            Some(ts) if now - ts > self.window => ConfidenceVerdict {
                score: STALE_SCORE,
                accepted: false,
            },
            Some(_) => ConfidenceVerdict {
                score: FRESH_SCORE,
                accepted: true,
            },
        };

        info!(
            items = evidence.len(),
            freshest = ?freshest.map(|ts| ts.to_rfc3339()),
            score = verdict.score,
            accepted = verdict.accepted,
            "Freshness evaluated"
        );

        verdict
    }
}

impl Default for FreshnessEvaluator {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_FRESHNESS_WINDOW_DAYS))
    }
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::absorb;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 14, 12, 0, 0).unwrap()
    }

    fn evidence(stamps: &[&str]) -> EvidenceSet {
        let mut set = EvidenceSet::new();
        absorb(
            &mut set,
            stamps
                .iter()
                .map(|s| json!({"name": "plan", "last_updated": s}))
                .collect(),
        );
        set
    }

    #[test]
    fn test_fresh_evidence_is_accepted() {
        let verdict = FreshnessEvaluator::default()
            .evaluate(&evidence(&["2025-08-13T09:00:00Z"]), now());
        assert_eq!(verdict, ConfidenceVerdict { score: 0.9, accepted: true });
    }

    #[test]
    fn test_stale_evidence_is_rejected() {
        let verdict = FreshnessEvaluator::default()
            .evaluate(&evidence(&["2025-08-04T12:00:00Z"]), now());
        assert_eq!(verdict, ConfidenceVerdict { score: 0.5, accepted: false });
    }

    #[test]
    fn test_no_timestamps_is_lowest_confidence() {
        let mut set = EvidenceSet::new();
        absorb(&mut set, vec![json!({"name": "undated"}), json!("raw text")]);

        let verdict = FreshnessEvaluator::default().evaluate(&set, now());
        assert_eq!(verdict, ConfidenceVerdict { score: 0.4, accepted: false });

        let verdict = FreshnessEvaluator::default().evaluate(&EvidenceSet::new(), now());
        assert_eq!(verdict.score, 0.4);
    }

    #[test]
    fn test_freshest_item_wins() {
        let verdict = FreshnessEvaluator::default().evaluate(
            &evidence(&["2025-07-01T00:00:00Z", "2025-08-14T08:00:00Z", "2025-06-01"]),
            now(),
        );
        assert!(verdict.accepted);
    }

    #[test]
    fn test_malformed_timestamps_are_skipped() {
        let verdict = FreshnessEvaluator::default()
            .evaluate(&evidence(&["last tuesday", "2025-08-13T09:00:00Z"]), now());
        assert!(verdict.accepted);

        let verdict = FreshnessEvaluator::default().evaluate(&evidence(&["not a date"]), now());
        assert_eq!(verdict.score, 0.4);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let exactly_three_days = "2025-08-11T12:00:00Z";
        let just_over = "2025-08-11T11:59:59Z";

        assert!(FreshnessEvaluator::default()
            .evaluate(&evidence(&[exactly_three_days]), now())
            .accepted);
        assert!(!FreshnessEvaluator::default()
            .evaluate(&evidence(&[just_over]), now())
            .accepted);
    }

    #[test]
    fn test_naive_timestamps_are_utc() {
        assert_eq!(
            parse_timestamp("2025-08-12T10:00:00"),
            Some(Utc.with_ymd_and_hms(2025, 8, 12, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2025-08-12 10:00:00.250"),
            Utc.with_ymd_and_hms(2025, 8, 12, 10, 0, 0)
                .unwrap()
                .checked_add_signed(Duration::milliseconds(250))
        );
        assert_eq!(
            parse_timestamp("2025-08-12"),
            Some(Utc.with_ymd_and_hms(2025, 8, 12, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_offsets_are_respected() {
        assert_eq!(
            parse_timestamp("2025-08-12T15:30:00+05:30"),
            Some(Utc.with_ymd_and_hms(2025, 8, 12, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2025-08-12T10:00:00Z"),
            parse_timestamp("2025-08-12T10:00:00+00:00")
        );
    }

    #[test]
    fn test_custom_window() {
        let evaluator = FreshnessEvaluator::with_window_days(30).unwrap();
        assert!(evaluator
            .evaluate(&evidence(&["2025-08-01T00:00:00Z"]), now())
            .accepted);
    }

    #[test]
    fn test_window_days_out_of_range_is_config_error() {
        assert!(matches!(
            FreshnessEvaluator::with_window_days(999_999_999_999_999),
            Err(OrchestrationError::ConfigError(_))
        ));
        assert!(matches!(
            FreshnessEvaluator::with_window_days(-1),
            Err(OrchestrationError::ConfigError(_))
        ));
    }
}
