use serde::{Deserialize, Serialize};

/// Raw value written in place of a matched index when no counterpart exists.
pub const NOT_FOUND_SENTINEL: i64 = -99999;

/// Primary signal component carried by a truth row or a reconstructed peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    S1,
    S2,
    /// Any other code (e.g. unclassified peaks), carried through untouched.
    Other(i64),
}

impl ComponentType {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ComponentType::S1,
            2 => ComponentType::S2,
            other => ComponentType::Other(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ComponentType::S1 => 1,
            ComponentType::S2 => 2,
            ComponentType::Other(code) => *code,
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentType::S1 => write!(f, "S1"),
            ComponentType::S2 => write!(f, "S2"),
            ComponentType::Other(code) => write!(f, "type {}", code),
        }
    }
}

/// Outcome assigned to a truth row by the upstream acceptance matcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    Found,
    Lost,
    Merged,
    Split,
    Misidentified,
    Other(String),
}

impl Outcome {
    /// Exact, case-sensitive match on the stored string. Anything else is
    /// kept verbatim so it serializes back unchanged.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "found" => Outcome::Found,
            "lost" => Outcome::Lost,
            "merged" => Outcome::Merged,
            "split" => Outcome::Split,
            "misidentified" => Outcome::Misidentified,
            other => Outcome::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Found => "found",
            Outcome::Lost => "lost",
            Outcome::Merged => "merged",
            Outcome::Split => "split",
            Outcome::Misidentified => "misidentified",
            Outcome::Other(s) => s.as_str(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found)
    }
}

impl From<String> for Outcome {
    fn from(raw: String) -> Self {
        Outcome::parse(&raw)
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        outcome.as_str().to_string()
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a matched counterpart in some other table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchIndex {
    Found(usize),
    NotFound,
}

impl MatchIndex {
    /// Convert a raw stored index. Any negative value means "no match".
    pub fn from_raw(raw: i64) -> Self {
        if raw >= 0 {
            MatchIndex::Found(raw as usize)
        } else {
            MatchIndex::NotFound
        }
    }

    pub fn to_raw(&self) -> i64 {
        match self {
            MatchIndex::Found(idx) => *idx as i64,
            MatchIndex::NotFound => NOT_FOUND_SENTINEL,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            MatchIndex::Found(idx) => Some(*idx),
            MatchIndex::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MatchIndex::Found(_))
    }
}

impl From<Option<usize>> for MatchIndex {
    fn from(idx: Option<usize>) -> Self {
        idx.map_or(MatchIndex::NotFound, MatchIndex::Found)
    }
}

/// Closed time interval `[start, end]` used by the overlap test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// `other.end + tolerance >= self.start && self.end + tolerance >= other.start`
    #[inline]
    pub fn overlaps(&self, other: &Interval, tolerance: i64) -> bool {
        other.end.saturating_add(tolerance) >= self.start
            && self.end.saturating_add(tolerance) >= other.start
    }
}

/// One simulated signal component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthRecord {
    pub event_number: u64,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub time: i64,
    pub endtime: i64,
    pub n_photon: u64,
    pub n_electron: u64,
}

impl TruthRecord {
    pub fn interval(&self) -> Interval {
        Interval::new(self.time, self.endtime)
    }
}

/// Acceptance-matcher verdict for the truth row at the same position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub outcome: Outcome,
    /// Row of the simulated peak this truth row was reconstructed as.
    pub matched_to: MatchIndex,
}

impl MatchRecord {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            matched_to: MatchIndex::NotFound,
        }
    }

    pub fn with_matched_to(mut self, matched_to: MatchIndex) -> Self {
        self.matched_to = matched_to;
        self
    }
}

/// Reconstructed event: main S1 and main S2 time ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub s1_time: i64,
    pub s1_endtime: i64,
    pub s2_time: i64,
    pub s2_endtime: i64,
}

impl EventRecord {
    pub fn s1_interval(&self) -> Interval {
        Interval::new(self.s1_time, self.s1_endtime)
    }

    pub fn s2_interval(&self) -> Interval {
        Interval::new(self.s2_time, self.s2_endtime)
    }
}

/// Reconstructed peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    pub time: i64,
    pub endtime: i64,
    pub area: f64,
    #[serde(rename = "type")]
    pub kind: ComponentType,
}

impl PeakRecord {
    pub fn interval(&self) -> Interval {
        Interval::new(self.time, self.endtime)
    }
}
