//! Event-level two-stage matching.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use saltmatch_core::{
    ComponentType, EventRecord, Interval, MatchError, MatchIndex, Result, TruthTable,
};

use crate::algorithms::filters::{
    FilterReport, MultiplicityFilter, QualityFilter, ReconstructionFilter, TruthFilter,
};
use crate::algorithms::pairing::pair_events;

use super::summary::{MatchLevel, MatchSummary};
use super::MatchedPairs;

/// Truth timing of one clean simulated event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventTiming {
    pub event_number: u64,
    pub s1: Interval,
    pub s2: Interval,
}

/// Intermediate result of event matching, before record selection.
#[derive(Debug, Clone)]
pub struct EventPairing {
    /// Truth after all three filters.
    pub truth: TruthTable,
    /// One entry per clean truth event: its simulated event.
    pub simu_to_truth: Vec<MatchIndex>,
    /// One entry per truth-matched simulated event: its salted event.
    pub salt_to_simu: Vec<MatchIndex>,
    pub reports: Vec<FilterReport>,
}

impl EventPairing {
    /// Simulated rows that found a truth event, in truth order.
    pub fn simulated_matched_rows(&self) -> Vec<usize> {
        self.simu_to_truth.iter().filter_map(MatchIndex::index).collect()
    }
}

/// Collapse each clean group into its S1 and S2 time ranges.
///
/// Every group must hold exactly one S1 and one S2 row, which the
/// multiplicity filter guarantees.
pub fn truth_event_timing(table: &TruthTable) -> Result<Vec<EventTiming>> {
    table
        .groups()
        .map(|group| {
            let mut s1 = group.rows_of(ComponentType::S1);
            let mut s2 = group.rows_of(ComponentType::S2);
            match (s1.next(), s1.next(), s2.next(), s2.next()) {
                (Some((a, _)), None, Some((b, _)), None) => Ok(EventTiming {
                    event_number: group.event_number,
                    s1: a.interval(),
                    s2: b.interval(),
                }),
                _ => Err(MatchError::MalformedGroup {
                    event_number: group.event_number,
                    s1: group.count(ComponentType::S1),
                    s2: group.count(ComponentType::S2),
                }),
            }
        })
        .collect()
}

/// Filter the truth, then pair truth → simulated → salted events.
pub fn pair_salt_to_simu_events(
    table: &TruthTable,
    simu: &[EventRecord],
    salt: &[EventRecord],
) -> Result<EventPairing> {
    let (truth, quality) = QualityFilter.apply(table);
    let (truth, multiplicity) = MultiplicityFilter.apply(&truth);
    // S1 only: simulated S2 timing is unreliable upstream.
    let (truth, found) = ReconstructionFilter::new(ComponentType::S1).apply(&truth);

    let timing = truth_event_timing(&truth)?;
    let references: Vec<Interval> = timing.iter().map(|t| t.s1).collect();
    let simu_s1: Vec<Interval> = simu.iter().map(EventRecord::s1_interval).collect();

    info!("Matching {} clean truth events to simulated events", references.len());
    let simu_to_truth = pair_events(&references, &simu_s1)?;

    let matched_simu: Vec<Interval> = simu_to_truth
        .iter()
        .filter_map(MatchIndex::index)
        .map(|i| simu[i].s1_interval())
        .collect();
    let salt_s1: Vec<Interval> = salt.iter().map(EventRecord::s1_interval).collect();

    info!("Matching {} simulated events to salted events", matched_simu.len());
    let salt_to_simu = pair_events(&matched_simu, &salt_s1)?;

    Ok(EventPairing {
        truth,
        simu_to_truth,
        salt_to_simu,
        reports: vec![quality, multiplicity, found],
    })
}

/// Match salted events to simulated events through the truth.
///
/// Returns equal-length, index-aligned salted and simulated subsets.
pub fn match_events(
    table: &TruthTable,
    simu: &[EventRecord],
    salt: &[EventRecord],
) -> Result<MatchedPairs<EventRecord>> {
    let start = Instant::now();
    let mut summary = MatchSummary::new(MatchLevel::Events, table.len());
    summary.simulated_candidates = simu.len();
    summary.salted_candidates = salt.len();

    let pairing = pair_salt_to_simu_events(table, simu, salt)?;
    let simulated_rows = pairing.simulated_matched_rows();

    summary.clean_truth_rows = pairing.truth.len();
    summary.clean_truth_events = pairing.truth.group_count();
    summary.truth_references = pairing.simu_to_truth.len();
    summary.matched_to_truth = simulated_rows.len();
    summary.matched_to_simu = pairing.salt_to_simu.iter().filter(|m| m.is_found()).count();
    summary.filters = pairing.reports.clone();
    summary.finish(start.elapsed());

    debug!(
        clean = summary.clean_truth_events,
        matched_to_truth = summary.matched_to_truth,
        matched_to_simu = summary.matched_to_simu,
        "event matching finished"
    );

    Ok(MatchedPairs::assemble(
        &simulated_rows,
        &pairing.salt_to_simu,
        simu,
        salt,
        summary,
    ))
}
