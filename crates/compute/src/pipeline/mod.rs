//! Two-stage matching orchestrator.
//!
//! Wires the truth filters and the pairing engine into the two matching
//! stages:
//!
//! - **Stage 1**: clean truth → simulated reconstruction.
//! - **Stage 2**: truth-matched simulated records → salted reconstruction.
//!
//! Only records valid at both stages make it into [`MatchedPairs`].

pub mod events;
pub mod peaks;
pub mod summary;

use saltmatch_core::MatchIndex;

pub use events::{match_events, pair_salt_to_simu_events, EventPairing, EventTiming};
pub use peaks::{match_peaks, PeakMatcher, PeakPairing};
pub use summary::{MatchLevel, MatchSummary};

/// Salted and simulated records matched to each other, index-aligned.
#[derive(Debug, Clone)]
pub struct MatchedPairs<R> {
    pub salted: Vec<R>,
    pub simulated: Vec<R>,
    /// Position of each `salted` record in the caller's salted table.
    pub salted_rows: Vec<usize>,
    /// Position of each `simulated` record in the caller's simulated table.
    pub simulated_rows: Vec<usize>,
    pub summary: MatchSummary,
}

impl<R: Clone> MatchedPairs<R> {
    /// Keep the pairs found at both stages.
    ///
    /// `simulated_rows[k]` is the simulated record that was paired to
    /// `salt_to_simu[k]`; found entries index the full salted table.
    pub(crate) fn assemble(
        simulated_rows: &[usize],
        salt_to_simu: &[MatchIndex],
        simulated: &[R],
        salted: &[R],
        summary: MatchSummary,
    ) -> Self {
        let (salted_rows, simulated_rows): (Vec<usize>, Vec<usize>) = simulated_rows
            .iter()
            .zip(salt_to_simu)
            .filter_map(|(&simu_row, m)| m.index().map(|salt_row| (salt_row, simu_row)))
            .unzip();

        Self {
            salted: salted_rows.iter().map(|&i| salted[i].clone()).collect(),
            simulated: simulated_rows.iter().map(|&i| simulated[i].clone()).collect(),
            salted_rows,
            simulated_rows,
            summary,
        }
    }

    pub fn len(&self) -> usize {
        self.salted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.salted.is_empty()
    }

    /// Iterate `(salted, simulated)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&R, &R)> + '_ {
        self.salted.iter().zip(self.simulated.iter())
    }
}
