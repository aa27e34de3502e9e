pub mod algorithms;
pub mod pipeline;

pub use algorithms::filters::{
    FilterReport, MultiplicityFilter, QualityFilter, ReconstructionFilter, TruthFilter,
};
pub use algorithms::pairing::{overlapping, pair_events, pair_peaks, DEFAULT_SAFEGUARD};
pub use pipeline::{
    match_events, match_peaks, pair_salt_to_simu_events, EventPairing, EventTiming, MatchLevel,
    MatchSummary, MatchedPairs, PeakMatcher, PeakPairing,
};
