//! Row-aligned truth/match table with a grouped view by `event_number`.
//!
//! Truth rows and match rows always travel together: every row removed
//! from one is removed from the other at the same index. Rows of one
//! simulated interaction (same `event_number`) are contiguous and groups
//! appear in ascending order, which lets the group index store plain row
//! ranges built once at construction.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;

use crate::error::{MatchError, Result};
use crate::record::{ComponentType, MatchRecord, TruthRecord};

#[derive(Debug, Clone, Default, Serialize)]
pub struct TruthTable {
    truth: Vec<TruthRecord>,
    matches: Vec<MatchRecord>,
    #[serde(skip)]
    groups: BTreeMap<u64, Range<usize>>,
}

/// Borrowed view of every row sharing one `event_number`.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    pub event_number: u64,
    /// Position of the first row of the group in the parent table.
    pub offset: usize,
    pub truth: &'a [TruthRecord],
    pub matches: &'a [MatchRecord],
}

impl<'a> Group<'a> {
    pub fn len(&self) -> usize {
        self.truth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truth.is_empty()
    }

    /// Number of rows of the given component type.
    pub fn count(&self, kind: ComponentType) -> usize {
        self.truth.iter().filter(|t| t.kind == kind).count()
    }

    /// Rows of the given component type, paired with their match rows.
    pub fn rows_of(
        &self,
        kind: ComponentType,
    ) -> impl Iterator<Item = (&'a TruthRecord, &'a MatchRecord)> + 'a {
        let (truth, matches) = (self.truth, self.matches);
        truth
            .iter()
            .zip(matches.iter())
            .filter(move |(t, _)| t.kind == kind)
    }
}

impl TruthTable {
    /// Build a table from parallel truth and match rows.
    ///
    /// Fails when the two inputs differ in length, when an event number is
    /// zero, or when event numbers are not ascending with contiguous groups.
    pub fn new(truth: Vec<TruthRecord>, matches: Vec<MatchRecord>) -> Result<Self> {
        if truth.len() != matches.len() {
            return Err(MatchError::LengthMismatch {
                truth: truth.len(),
                matches: matches.len(),
            });
        }

        let mut groups: BTreeMap<u64, Range<usize>> = BTreeMap::new();
        let mut previous: Option<u64> = None;

        for (row, record) in truth.iter().enumerate() {
            let event_number = record.event_number;
            if event_number == 0 {
                return Err(MatchError::InvalidEventNumber { row, value: 0 });
            }

            match previous {
                Some(prev) if event_number == prev => {
                    if let Some(range) = groups.get_mut(&event_number) {
                        range.end = row + 1;
                    }
                }
                Some(prev) if event_number < prev => {
                    return Err(MatchError::UnorderedEventNumber {
                        row,
                        previous: prev,
                        found: event_number,
                    });
                }
                _ => {
                    groups.insert(event_number, row..row + 1);
                }
            }
            previous = Some(event_number);
        }

        Ok(Self {
            truth,
            matches,
            groups,
        })
    }

    /// Check that event numbers start at 1 and have no gaps.
    ///
    /// Raw inputs from the simulation store satisfy this; filtered tables
    /// generally do not.
    pub fn check_dense(&self) -> Result<()> {
        for (expected, &found) in (1u64..).zip(self.groups.keys()) {
            if expected != found {
                return Err(MatchError::EventNumberGap { expected, found });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.truth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truth.is_empty()
    }

    pub fn truth(&self) -> &[TruthRecord] {
        &self.truth
    }

    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, event_number: u64) -> Option<Group<'_>> {
        self.groups
            .get(&event_number)
            .map(|range| self.view(event_number, range.clone()))
    }

    /// Groups in ascending `event_number` order.
    pub fn groups(&self) -> impl Iterator<Item = Group<'_>> + '_ {
        self.groups
            .iter()
            .map(move |(&event_number, range)| self.view(event_number, range.clone()))
    }

    /// Copy of the table holding only the groups for which `keep` is true.
    pub fn retain_groups<F>(&self, mut keep: F) -> TruthTable
    where
        F: FnMut(&Group<'_>) -> bool,
    {
        let mut truth = Vec::with_capacity(self.truth.len());
        let mut matches = Vec::with_capacity(self.matches.len());
        let mut groups = BTreeMap::new();

        for group in self.groups() {
            if !keep(&group) {
                continue;
            }
            let start = truth.len();
            truth.extend_from_slice(group.truth);
            matches.extend_from_slice(group.matches);
            groups.insert(group.event_number, start..truth.len());
        }

        TruthTable {
            truth,
            matches,
            groups,
        }
    }

    /// Copy of the first `max_rows` rows. A group cut by the limit keeps
    /// only its leading rows.
    pub fn truncate(&self, max_rows: usize) -> TruthTable {
        if max_rows >= self.truth.len() {
            return self.clone();
        }

        let groups = self
            .groups
            .iter()
            .filter(|(_, range)| range.start < max_rows)
            .map(|(&event_number, range)| (event_number, range.start..range.end.min(max_rows)))
            .collect();

        TruthTable {
            truth: self.truth[..max_rows].to_vec(),
            matches: self.matches[..max_rows].to_vec(),
            groups,
        }
    }

    fn view(&self, event_number: u64, range: Range<usize>) -> Group<'_> {
        Group {
            event_number,
            offset: range.start,
            truth: &self.truth[range.clone()],
            matches: &self.matches[range],
        }
    }
}
