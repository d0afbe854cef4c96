//! Report data types
//!
//! Counters and per-recipe summaries produced by the aggregator and
//! consumed by the output layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::utils::Timezone;

/// Filter-object usage counters for one bucket
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct FoStats {
    pub(crate) total: u64,
    pub(crate) has_fo: u64,
    pub(crate) fo_only: u64,
}

impl FoStats {
    pub(crate) fn add(&mut self, other: &FoStats) {
        self.total += other.total;
        self.has_fo += other.has_fo;
        self.fo_only += other.fo_only;
    }

    pub(crate) fn has_fo_pct(&self) -> f64 {
        percent(self.has_fo, self.total)
    }

    pub(crate) fn fo_only_pct(&self) -> f64 {
        percent(self.fo_only, self.total)
    }
}

pub(crate) fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Which table a recipe is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RecipeGroup {
    Experiments,
    Heartbeat,
    All,
}

impl RecipeGroup {
    pub(crate) fn title(self) -> &'static str {
        match self {
            RecipeGroup::Experiments => "Experiments",
            RecipeGroup::Heartbeat => "Heartbeat",
            RecipeGroup::All => "All recipes",
        }
    }
}

/// Month-bucketed filter-object counters per group
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct FilterObjectStats {
    pub(crate) groups: BTreeMap<RecipeGroup, BTreeMap<String, FoStats>>,
}

impl FilterObjectStats {
    pub(crate) fn record(&mut self, group: RecipeGroup, month: String, stats: &FoStats) {
        self.groups
            .entry(group)
            .or_default()
            .entry(month)
            .or_default()
            .add(stats);
    }

    pub(crate) fn merge(&mut self, other: FilterObjectStats) {
        for (group, months) in other.groups {
            for (month, stats) in months {
                self.record(group, month, &stats);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Revision events for one (month, action type) bucket
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ChangeCounts {
    pub(crate) created: u64,
    pub(crate) updated: u64,
    pub(crate) paused: u64,
}

impl ChangeCounts {
    pub(crate) fn add(&mut self, other: &ChangeCounts) {
        self.created += other.created;
        self.updated += other.updated;
        self.paused += other.paused;
    }
}

/// Keyed by (month, action name)
pub(crate) type ChangeTable = BTreeMap<(String, String), ChangeCounts>;

pub(crate) fn merge_change_tables(into: &mut ChangeTable, from: ChangeTable) {
    for (key, counts) in from {
        into.entry(key).or_default().add(&counts);
    }
}

/// Filter-expression churn of one recipe
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ExpressionSummary {
    pub(crate) id: i64,
    pub(crate) action: String,
    pub(crate) revisions: usize,
    /// Latest `updated` timestamp across revisions (empty when none parse)
    pub(crate) last_revision: String,
    pub(crate) filter_object_used: bool,
    pub(crate) expression_changes: usize,
    pub(crate) last_expression: String,
}

/// Identity of a recipe queued for history lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecipeInfo {
    pub(crate) id: i64,
    pub(crate) action: String,
    pub(crate) slug: String,
}

/// Enabled/disabled lifetime of one recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct LifecycleSummary {
    pub(crate) id: i64,
    pub(crate) action: String,
    pub(crate) slug: String,
    pub(crate) live: bool,
    pub(crate) first: Option<String>,
    pub(crate) last: Option<String>,
    pub(crate) days: i64,
    pub(crate) revisions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct LatestRow {
    pub(crate) date: String,
    pub(crate) id: i64,
    pub(crate) action: String,
    pub(crate) slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ExpressionRow {
    pub(crate) date: String,
    pub(crate) id: i64,
    pub(crate) action: String,
    pub(crate) expression: String,
}

/// Year and action restrictions applied to recipes before counting
#[derive(Debug, Clone, Default)]
pub(crate) struct RecipeFilter {
    /// Empty means every year
    pub(crate) years: Vec<i32>,
    pub(crate) excluded_actions: Vec<&'static str>,
    pub(crate) timezone: Timezone,
}

impl RecipeFilter {
    pub(crate) fn new(years: Vec<i32>, timezone: Timezone) -> Self {
        Self {
            years,
            excluded_actions: Vec::new(),
            timezone,
        }
    }

    pub(crate) fn excluding(mut self, actions: &[&'static str]) -> Self {
        self.excluded_actions.extend_from_slice(actions);
        self
    }

    pub(crate) fn excludes_action(&self, action: &str) -> bool {
        self.excluded_actions.contains(&action)
    }

    pub(crate) fn in_years(&self, ts: DateTime<Utc>) -> bool {
        self.years.is_empty() || self.years.contains(&self.timezone.year(ts))
    }
}
