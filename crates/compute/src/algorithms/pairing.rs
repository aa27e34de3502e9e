//! Interval pairing engine.
//!
//! For every reference interval, find the candidate intervals overlapping it
//! under the closed test
//! `candidate.end + tolerance >= reference.start && reference.end + tolerance >= candidate.start`.
//! Reference scans are independent and run in parallel; results come back in
//! reference order.
//!
//! Two policies decide what happens when several candidates overlap:
//! - events: more than one overlap is an invariant violation ([`pair_events`]);
//! - peaks: the candidate with the largest area wins ([`pair_peaks`]).

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use saltmatch_core::{Interval, MatchError, MatchIndex, PeakRecord, Result};

/// Default overlap tolerance for peak pairing, in time units.
///
/// Simulated S2 timing upstream is known to be off by up to this much.
pub const DEFAULT_SAFEGUARD: i64 = 1_000;

/// Positions of all candidates overlapping `reference`.
pub fn overlapping(reference: &Interval, candidates: &[Interval], tolerance: i64) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| reference.overlaps(c, tolerance))
        .map(|(j, _)| j)
        .collect()
}

/// Pair each reference with the single candidate overlapping it.
///
/// Only the S1 interval of an event is passed in: the S2 overlap is not
/// checked because upstream S2 timing of simulated events is unreliable.
/// This is a known limitation, not a guarantee that S2s line up.
///
/// Fails with [`MatchError::AmbiguousMatch`] on the first reference (in
/// reference order) overlapping more than one candidate.
pub fn pair_events(references: &[Interval], candidates: &[Interval]) -> Result<Vec<MatchIndex>> {
    let start = Instant::now();
    info!(
        "Pairing {} events against {} candidates...",
        references.len(),
        candidates.len()
    );

    let hits: Vec<Vec<usize>> = references
        .par_iter()
        .map(|r| overlapping(r, candidates, 0))
        .collect();

    let mut paired = Vec::with_capacity(hits.len());
    for (reference, found) in hits.into_iter().enumerate() {
        let index = match found.as_slice() {
            [] => MatchIndex::NotFound,
            [j] => MatchIndex::Found(*j),
            _ => {
                return Err(MatchError::AmbiguousMatch {
                    reference,
                    candidates: found,
                })
            }
        };
        paired.push(index);
    }

    log_done(&paired, start);
    Ok(paired)
}

/// Pair each reference with the largest-area peak overlapping it within
/// `safeguard`. Ties keep the earliest candidate.
pub fn pair_peaks(
    references: &[Interval],
    candidates: &[PeakRecord],
    safeguard: i64,
) -> Vec<MatchIndex> {
    let start = Instant::now();
    info!(
        "Pairing {} peaks against {} candidates (safeguard {})...",
        references.len(),
        candidates.len(),
        safeguard
    );

    let intervals: Vec<Interval> = candidates.iter().map(PeakRecord::interval).collect();
    let paired: Vec<MatchIndex> = references
        .par_iter()
        .map(|r| {
            let mut best: Option<usize> = None;
            for (j, c) in intervals.iter().enumerate() {
                if !r.overlaps(c, safeguard) {
                    continue;
                }
                best = match best {
                    Some(b) if candidates[j].area > candidates[b].area => Some(j),
                    Some(b) => Some(b),
                    None => Some(j),
                };
            }
            MatchIndex::from(best)
        })
        .collect();

    log_done(&paired, start);
    paired
}

fn log_done(paired: &[MatchIndex], start: Instant) {
    let found = paired.iter().filter(|m| m.is_found()).count();
    debug!(
        references = paired.len(),
        found,
        lost = paired.len() - found,
        "pairing scan finished"
    );
    info!(
        "  Paired {}/{} in {:.1}s",
        found,
        paired.len(),
        start.elapsed().as_secs_f64()
    );
}
