//! Peak-level two-stage matching.
//!
//! Stage 1 does not scan: the acceptance matcher already stored, for each
//! truth row, which simulated peak it became (`matched_to`). Stage 2 pairs
//! those simulated peaks with salted peaks of the same component, widening
//! the overlap window by a safeguard and resolving pile-up by area.

use std::time::Instant;

use tracing::{debug, info};

use saltmatch_core::config::PeakConfig;
use saltmatch_core::{
    ComponentType, Interval, MatchError, MatchIndex, PeakRecord, Result, TruthTable,
};

use crate::algorithms::filters::{FilterReport, ReconstructionFilter, TruthFilter};
use crate::algorithms::pairing::pair_peaks;

use super::summary::{MatchLevel, MatchSummary};
use super::MatchedPairs;

/// Intermediate result of peak matching, before record selection.
#[derive(Debug, Clone)]
pub struct PeakPairing {
    /// Truncated truth after the reconstruction-success filter.
    pub truth: TruthTable,
    /// One entry per clean truth row: its simulated peak.
    pub simu_to_truth: Vec<MatchIndex>,
    /// One entry per truth-matched simulated peak: its row in the salted table.
    pub salt_to_simu: Vec<MatchIndex>,
    pub reports: Vec<FilterReport>,
    /// Salted peaks that passed the component and pile-up selection.
    pub salted_candidates: usize,
}

impl PeakPairing {
    /// Simulated rows that were matched to truth, in truth order.
    pub fn simulated_matched_rows(&self) -> Vec<usize> {
        self.simu_to_truth.iter().filter_map(MatchIndex::index).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PeakMatcher {
    config: PeakConfig,
}

impl PeakMatcher {
    pub fn new(config: PeakConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PeakConfig {
        &self.config
    }

    /// Salted peaks eligible for pairing and their rows in `salt`.
    ///
    /// Keeps peaks of the configured component; for S2 also drops small
    /// peaks at or below the pile-up area threshold.
    pub fn select_candidates(&self, salt: &[PeakRecord]) -> (Vec<PeakRecord>, Vec<usize>) {
        let component = self.config.component;
        let threshold = self.config.pileup_area_threshold;
        salt.iter()
            .enumerate()
            .filter(|(_, p)| p.kind == component)
            .filter(|(_, p)| component != ComponentType::S2 || p.area > threshold)
            .map(|(i, p)| (*p, i))
            .unzip()
    }

    /// Filter the truth, reindex it into the simulated peaks and pair those
    /// with the salted peaks.
    pub fn pair(
        &self,
        table: &TruthTable,
        simu: &[PeakRecord],
        salt: &[PeakRecord],
    ) -> Result<PeakPairing> {
        let (candidates, candidate_rows) = self.select_candidates(salt);
        debug!(
            salted = salt.len(),
            candidates = candidates.len(),
            component = %self.config.component,
            "selected salted peak candidates"
        );

        let truncated = table.truncate(self.config.max_truth_rows);
        let (truth, found) = ReconstructionFilter::new(self.config.component).apply(&truncated);

        let simu_to_truth: Vec<MatchIndex> = truth.matches().iter().map(|m| m.matched_to).collect();
        for (row, m) in simu_to_truth.iter().enumerate() {
            if let Some(index) = m.index() {
                if index >= simu.len() {
                    return Err(MatchError::IndexOutOfRange {
                        row,
                        index,
                        len: simu.len(),
                    });
                }
            }
        }

        let matched_simu: Vec<Interval> = simu_to_truth
            .iter()
            .filter_map(MatchIndex::index)
            .map(|i| simu[i].interval())
            .collect();

        info!("Matching {} simulated peaks to salted peaks", matched_simu.len());
        let salt_to_simu = pair_peaks(&matched_simu, &candidates, self.config.safeguard)
            .into_iter()
            .map(|m| MatchIndex::from(m.index().map(|j| candidate_rows[j])))
            .collect();

        Ok(PeakPairing {
            truth,
            simu_to_truth,
            salt_to_simu,
            reports: vec![found],
            salted_candidates: candidates.len(),
        })
    }

    /// Match salted peaks to simulated peaks through the truth.
    pub fn run(
        &self,
        table: &TruthTable,
        simu: &[PeakRecord],
        salt: &[PeakRecord],
    ) -> Result<MatchedPairs<PeakRecord>> {
        let start = Instant::now();
        let mut summary = MatchSummary::new(
            MatchLevel::Peaks,
            table.len().min(self.config.max_truth_rows),
        );
        summary.simulated_candidates = simu.len();

        let pairing = self.pair(table, simu, salt)?;
        let simulated_rows = pairing.simulated_matched_rows();

        summary.salted_candidates = pairing.salted_candidates;
        summary.clean_truth_rows = pairing.truth.len();
        summary.clean_truth_events = pairing.truth.group_count();
        summary.truth_references = pairing.simu_to_truth.len();
        summary.matched_to_truth = simulated_rows.len();
        summary.matched_to_simu = pairing.salt_to_simu.iter().filter(|m| m.is_found()).count();
        summary.filters = pairing.reports.clone();
        summary.finish(start.elapsed());

        debug!(
            matched_to_truth = summary.matched_to_truth,
            matched_to_simu = summary.matched_to_simu,
            "peak matching finished"
        );

        Ok(MatchedPairs::assemble(
            &simulated_rows,
            &pairing.salt_to_simu,
            simu,
            salt,
            summary,
        ))
    }
}

/// Match peaks of `component` with default limits and safeguard.
pub fn match_peaks(
    table: &TruthTable,
    simu: &[PeakRecord],
    salt: &[PeakRecord],
    component: ComponentType,
) -> Result<MatchedPairs<PeakRecord>> {
    let config = PeakConfig {
        component,
        ..PeakConfig::default()
    };
    PeakMatcher::new(config).run(table, simu, salt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use saltmatch_core::{MatchRecord, Outcome, TruthRecord};

    fn truth_row(event_number: u64, kind: ComponentType) -> TruthRecord {
        TruthRecord {
            event_number,
            kind,
            time: 0,
            endtime: 0,
            n_photon: 10,
            n_electron: 10,
        }
    }

    fn matched(outcome: Outcome, matched_to: i64) -> MatchRecord {
        MatchRecord::new(outcome).with_matched_to(MatchIndex::from_raw(matched_to))
    }

    fn peak(time: i64, endtime: i64, area: f64, kind: ComponentType) -> PeakRecord {
        PeakRecord {
            time,
            endtime,
            area,
            kind,
        }
    }

    fn s2(time: i64, endtime: i64, area: f64) -> PeakRecord {
        peak(time, endtime, area, ComponentType::S2)
    }

    #[test]
    fn candidates_filtered_by_type_and_pileup() {
        let salt = vec![
            s2(0, 10, 100.0),
            peak(0, 10, 100.0, ComponentType::S1),
            s2(0, 10, 5.0),
            s2(0, 10, 5.5),
        ];
        let (peaks, rows) = PeakMatcher::default().select_candidates(&salt);
        assert_eq!(rows, vec![0, 3]);
        assert_eq!(peaks.len(), 2);

        let s1 = PeakMatcher::new(PeakConfig {
            component: ComponentType::S1,
            ..PeakConfig::default()
        });
        let salt = vec![peak(0, 10, 1.0, ComponentType::S1), s2(0, 10, 100.0)];
        assert_eq!(s1.select_candidates(&salt).1, vec![0], "no area cut for S1");
    }

    #[test]
    fn reindexes_through_matched_to() {
        let truth = vec![
            truth_row(1, ComponentType::S1),
            truth_row(1, ComponentType::S2),
            truth_row(2, ComponentType::S1),
            truth_row(2, ComponentType::S2),
        ];
        let matches = vec![
            matched(Outcome::Found, 0),
            matched(Outcome::Found, 1),
            matched(Outcome::Found, 2),
            matched(Outcome::Lost, -99999),
        ];
        let table = TruthTable::new(truth, matches).unwrap();

        let simu = vec![
            peak(100, 200, 30.0, ComponentType::S1),
            s2(5_000, 9_000, 800.0),
            peak(20_000, 20_100, 25.0, ComponentType::S1),
        ];
        let salt = vec![
            peak(100, 200, 30.0, ComponentType::S1),
            s2(9_500, 12_000, 900.0),
            s2(4_000, 9_100, 3.0),
        ];

        let pairs = PeakMatcher::default().run(&table, &simu, &salt).unwrap();
        // Event 2 is dropped (S2 lost); event 1's S1 row maps to an S1
        // simulated peak, which finds no S2 salted partner.
        assert_eq!(pairs.summary.clean_truth_events, 1);
        assert_eq!(pairs.summary.matched_to_truth, 2);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs.simulated_rows, vec![1]);
        assert_eq!(pairs.salted_rows, vec![1], "pile-up peak removed, safeguard reaches row 1");
        assert_eq!(pairs.summary.salted_candidates, 1);
    }

    #[test]
    fn truncation_limits_truth() {
        let truth = vec![
            truth_row(1, ComponentType::S2),
            truth_row(2, ComponentType::S2),
        ];
        let matches = vec![matched(Outcome::Found, 0), matched(Outcome::Found, 1)];
        let table = TruthTable::new(truth, matches).unwrap();
        let simu = vec![s2(0, 100, 50.0), s2(10_000, 10_100, 50.0)];

        let matcher = PeakMatcher::new(PeakConfig {
            max_truth_rows: 1,
            ..PeakConfig::default()
        });
        let pairs = matcher.run(&table, &simu, &simu).unwrap();
        assert_eq!(pairs.summary.truth_rows, 1);
        assert_eq!(pairs.simulated_rows, vec![0]);
        assert_eq!(pairs.salted_rows, vec![0]);
    }

    #[test]
    fn matched_to_out_of_range_is_an_error() {
        let table = TruthTable::new(
            vec![truth_row(1, ComponentType::S2)],
            vec![matched(Outcome::Found, 7)],
        )
        .unwrap();
        let err = PeakMatcher::default().pair(&table, &[], &[]).unwrap_err();
        assert!(matches!(err, MatchError::IndexOutOfRange { row: 0, index: 7, len: 0 }));
    }

    #[test]
    fn largest_salted_peak_wins() {
        let table = TruthTable::new(
            vec![truth_row(1, ComponentType::S2)],
            vec![matched(Outcome::Found, 0)],
        )
        .unwrap();
        let simu = vec![s2(1_000, 2_000, 50.0)];
        let salt = vec![s2(500, 1_200, 30.0), s2(1_800, 2_500, 70.0)];
        let pairs = match_peaks(&table, &simu, &salt, ComponentType::S2).unwrap();
        assert_eq!(pairs.salted_rows, vec![1]);
        assert_eq!(pairs.salted[0].area, 70.0);
    }
}
