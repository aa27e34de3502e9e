//! Truth-quality filters.
//!
//! Each filter inspects one `event_number` group at a time and, when the
//! group is bad, drops every row of it from both the truth and the match
//! columns. Filters never fail; an empty table is a valid result.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use saltmatch_core::{ComponentType, Group, TruthTable};

/// What a filter removed from its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    pub filter: String,
    pub rows_in: usize,
    pub rows_removed: usize,
    pub groups_in: usize,
    pub groups_removed: usize,
}

impl FilterReport {
    fn new(filter: &str, before: &TruthTable, after: &TruthTable) -> Self {
        Self {
            filter: filter.to_string(),
            rows_in: before.len(),
            rows_removed: before.len() - after.len(),
            groups_in: before.group_count(),
            groups_removed: before.group_count() - after.group_count(),
        }
    }

    /// Share of input rows removed, in percent. Zero for an empty input.
    pub fn percent_removed(&self) -> f64 {
        if self.rows_in == 0 {
            0.0
        } else {
            self.rows_removed as f64 / self.rows_in as f64 * 100.0
        }
    }
}

/// A group-level predicate over a truth table.
pub trait TruthFilter: Sync {
    /// Short identifier used in reports.
    fn name(&self) -> &'static str;

    /// Human-readable reason printed next to the discarded share.
    fn reason(&self) -> String;

    /// True when every row of `group` must be discarded.
    fn is_bad(&self, group: &Group<'_>) -> bool;

    /// Return a filtered copy of `table` along with what was removed.
    fn apply(&self, table: &TruthTable) -> (TruthTable, FilterReport) {
        let groups: Vec<Group<'_>> = table.groups().collect();
        let bad: Vec<bool> = groups.par_iter().map(|g| self.is_bad(g)).collect();

        let mut verdicts = bad.into_iter();
        let kept = table.retain_groups(|_| !verdicts.next().unwrap_or(true));

        let report = FilterReport::new(self.name(), table, &kept);
        info!(
            "Filter out {:.2} percent of events due to {}",
            report.percent_removed(),
            self.reason()
        );
        if kept.is_empty() && !table.is_empty() {
            warn!(filter = self.name(), "no truth events survived");
        }
        (kept, report)
    }
}

/// Drops events without an S1 or an S2, or with an empty S1/S2 yield.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityFilter;

impl TruthFilter for QualityFilter {
    fn name(&self) -> &'static str {
        "missing_s1_s2"
    }

    fn reason(&self) -> String {
        "missing S1 or S2 or both".to_string()
    }

    fn is_bad(&self, group: &Group<'_>) -> bool {
        let mut has_s1 = false;
        let mut has_s2 = false;
        for row in group.truth {
            match row.kind {
                ComponentType::S1 => {
                    if row.n_photon == 0 {
                        return true;
                    }
                    has_s1 = true;
                }
                ComponentType::S2 => {
                    if row.n_electron == 0 {
                        return true;
                    }
                    has_s2 = true;
                }
                ComponentType::Other(_) => {}
            }
        }
        !(has_s1 && has_s2)
    }
}

/// Drops events that do not have exactly one S1 and exactly one S2.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiplicityFilter;

impl TruthFilter for MultiplicityFilter {
    fn name(&self) -> &'static str {
        "multiple_s1_s2"
    }

    fn reason(&self) -> String {
        "multiple S1 or S2".to_string()
    }

    fn is_bad(&self, group: &Group<'_>) -> bool {
        group.count(ComponentType::S1) != 1 || group.count(ComponentType::S2) != 1
    }
}

/// Drops events whose `component` row was not reconstructed as "found".
///
/// The whole group goes, including rows of the other component.
#[derive(Debug, Clone, Copy)]
pub struct ReconstructionFilter {
    pub component: ComponentType,
}

impl ReconstructionFilter {
    pub fn new(component: ComponentType) -> Self {
        Self { component }
    }
}

impl TruthFilter for ReconstructionFilter {
    fn name(&self) -> &'static str {
        "not_found"
    }

    fn reason(&self) -> String {
        format!("{} not found", self.component)
    }

    fn is_bad(&self, group: &Group<'_>) -> bool {
        let mut rows = group.rows_of(self.component);
        match (rows.next(), rows.next()) {
            (Some((_, m)), None) => !m.outcome.is_found(),
            _ => true,
        }
    }
}
