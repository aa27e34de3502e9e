use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithms::filters::FilterReport;

/// Which reconstructed records a run matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLevel {
    Events,
    Peaks,
}

/// Counts collected while running one two-stage match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub level: MatchLevel,
    /// Truth rows handed to the matcher (after any truncation).
    pub truth_rows: usize,
    /// Truth rows left after filtering.
    pub clean_truth_rows: usize,
    pub clean_truth_events: usize,
    pub filters: Vec<FilterReport>,
    pub simulated_candidates: usize,
    /// Salted records eligible for pairing (after type/area pre-selection).
    pub salted_candidates: usize,
    /// References paired against the simulated table.
    pub truth_references: usize,
    pub matched_to_truth: usize,
    pub matched_to_simu: usize,
    pub elapsed_ms: u64,
    pub generated_at: DateTime<Utc>,
}

impl MatchSummary {
    pub(crate) fn new(level: MatchLevel, truth_rows: usize) -> Self {
        Self {
            level,
            truth_rows,
            clean_truth_rows: 0,
            clean_truth_events: 0,
            filters: Vec::new(),
            simulated_candidates: 0,
            salted_candidates: 0,
            truth_references: 0,
            matched_to_truth: 0,
            matched_to_simu: 0,
            elapsed_ms: 0,
            generated_at: Utc::now(),
        }
    }

    pub(crate) fn finish(&mut self, elapsed: Duration) {
        self.elapsed_ms = elapsed.as_millis() as u64;
        self.generated_at = Utc::now();
    }

    /// Share of truth-matched simulated records also found in the salted data.
    pub fn salt_efficiency(&self) -> f64 {
        if self.matched_to_truth == 0 {
            0.0
        } else {
            self.matched_to_simu as f64 / self.matched_to_truth as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_handles_zero() {
        let summary = MatchSummary::new(MatchLevel::Events, 0);
        assert_eq!(summary.salt_efficiency(), 0.0);
    }

    #[test]
    fn serializes_level_lowercase() {
        let mut summary = MatchSummary::new(MatchLevel::Peaks, 10);
        summary.matched_to_truth = 4;
        summary.matched_to_simu = 3;
        assert_eq!(summary.salt_efficiency(), 0.75);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["level"], "peaks");
        assert_eq!(json["truth_rows"], 10);
    }
}
