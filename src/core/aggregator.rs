//! Aggregation logic for all reports
//!
//! Pure functions from decoded API records to report data. Partial results
//! from different pages or workers merge into the same totals regardless of
//! order.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::api::{Recipe, Revision};
use crate::consts::{ACTION_CONSOLE_LOG, ACTION_HEARTBEAT, PLACEHOLDER, UNKNOWN};
use crate::core::types::{
    ChangeCounts, ChangeTable, ExpressionRow, ExpressionSummary, FilterObjectStats, FoStats,
    LatestRow, LifecycleSummary, RecipeFilter, RecipeGroup, RecipeInfo,
};
use crate::utils::{Timezone, date_prefix, parse_timestamp, rfc3339_to_unix};

const SECONDS_PER_DAY: i64 = 86_400;

/// Group a recipe by its action; `None` drops it from the report
pub(crate) fn classify_group(action: &str, split: bool) -> Option<RecipeGroup> {
    if !split {
        return Some(RecipeGroup::All);
    }
    match action {
        ACTION_CONSOLE_LOG => None,
        ACTION_HEARTBEAT => Some(RecipeGroup::Heartbeat),
        _ => Some(RecipeGroup::Experiments),
    }
}

/// `latest_revision.updated` as a timestamp, logging why it is unusable
pub(crate) fn updated_at(recipe: &Recipe) -> Option<DateTime<Utc>> {
    let Some(raw) = recipe.updated() else {
        warn!(id = recipe.id, "recipe has no latest_revision.updated");
        return None;
    };
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warn!(id = recipe.id, updated = raw, "unparsable latest_revision.updated");
    }
    parsed
}

/// True when a recipe was last updated within the filter's years and its
/// action is not excluded
pub(crate) fn admits(filter: &RecipeFilter, recipe: &Recipe) -> bool {
    if filter.excludes_action(recipe.action_name().unwrap_or("")) {
        return false;
    }
    updated_at(recipe).is_some_and(|ts| filter.in_years(ts))
}

/// Count filter-object usage of one page of recipes
pub(crate) fn tally_filter_objects(
    recipes: &[Recipe],
    filter: &RecipeFilter,
    split: bool,
) -> FilterObjectStats {
    let mut stats = FilterObjectStats::default();

    for recipe in recipes {
        let Some(group) = classify_group(recipe.action_name().unwrap_or(""), split) else {
            continue;
        };
        let Some(updated) = updated_at(recipe) else {
            continue;
        };
        if !filter.in_years(updated) {
            continue;
        }
        let Some(revision) = recipe.revision() else {
            continue;
        };

        let has_fo = revision.has_filter_object();
        let fo_only = has_fo && revision.extra_expression().is_empty();
        stats.record(
            group,
            filter.timezone.month_key(updated),
            &FoStats {
                total: 1,
                has_fo: u64::from(has_fo),
                fo_only: u64::from(fo_only),
            },
        );
    }

    stats
}

/// Decode history entries, dropping the ones that do not decode
pub(crate) fn parse_revisions(id: i64, entries: Vec<Value>) -> Vec<Revision> {
    entries
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Revision>(value) {
            Ok(revision) => Some(revision),
            Err(e) => {
                warn!(id, error = %e, "skipping undecodable revision");
                None
            }
        })
        .collect()
}

/// Classify revision events into created / updated / paused per month and
/// action type. Revisions are ordered by `date_created`; ones without a
/// parsable `date_created` are skipped.
pub(crate) fn count_changes(
    revisions: &[Revision],
    fallback_action: &str,
    filter: &RecipeFilter,
) -> ChangeTable {
    let mut dated: Vec<(DateTime<Utc>, &Revision)> = revisions
        .iter()
        .filter_map(|rev| {
            let ts = rev.date_created.as_deref().and_then(parse_timestamp);
            if ts.is_none() {
                warn!("revision without a usable date_created");
            }
            ts.map(|ts| (ts, rev))
        })
        .collect();
    dated.sort_by_key(|(ts, _)| *ts);

    let mut table = ChangeTable::new();
    let mut previous_enabled: Option<bool> = None;

    for (i, (ts, rev)) in dated.iter().enumerate() {
        let enabled = rev.enabled;
        let event = if i == 0 {
            ChangeCounts {
                created: 1,
                ..Default::default()
            }
        } else if previous_enabled == Some(true) && enabled == Some(false) {
            ChangeCounts {
                paused: 1,
                ..Default::default()
            }
        } else {
            ChangeCounts {
                updated: 1,
                ..Default::default()
            }
        };
        previous_enabled = enabled;

        if !filter.in_years(*ts) {
            continue;
        }
        let action = rev
            .action_name()
            .filter(|a| !a.is_empty())
            .unwrap_or(fallback_action)
            .to_string();
        table
            .entry((filter.timezone.month_key(*ts), action))
            .or_default()
            .add(&event);
    }

    table
}

/// Summarize filter-expression churn over a recipe's history (API order)
pub(crate) fn summarize_expressions(id: i64, revisions: &[Revision]) -> ExpressionSummary {
    let mut summary = ExpressionSummary {
        id,
        ..Default::default()
    };
    let mut last_revision_ts = 0;

    for rev in revisions {
        summary.action = rev.action_name().unwrap_or(UNKNOWN).to_string();
        summary.revisions += 1;

        if rev.filter_object.is_none() {
            warn!(id, "revision has no filter_object");
        }
        if rev.has_filter_object() {
            summary.filter_object_used = true;
        }

        let updated = rev.updated.as_deref().unwrap_or("");
        let ts = rfc3339_to_unix(updated);
        if last_revision_ts < ts {
            last_revision_ts = ts;
            summary.last_revision = updated.to_string();
        }

        let expression = rev.filter_expression.as_deref().unwrap_or("");
        if summary.last_expression != expression {
            summary.last_expression = expression.to_string();
            summary.expression_changes += 1;
        }
    }

    summary
}

/// Identity of a recipe for the lifecycle report
pub(crate) fn recipe_info(recipe: &Recipe) -> RecipeInfo {
    RecipeInfo {
        id: recipe.id,
        action: recipe.action_name().unwrap_or(UNKNOWN).to_string(),
        slug: recipe.slug().unwrap_or("").to_string(),
    }
}

/// First/last revision, live state and age of a recipe.
/// Live recipes count their days up to `now`.
pub(crate) fn summarize_lifecycle(
    info: RecipeInfo,
    revisions: &[Revision],
    now: DateTime<Utc>,
) -> LifecycleSummary {
    let mut earliest: Option<(DateTime<Utc>, &str)> = None;
    let mut latest: Option<(DateTime<Utc>, &str, bool)> = None;

    // history is chronological in practice, but don't rely on it
    for rev in revisions {
        let Some(raw) = rev.date_created.as_deref() else {
            continue;
        };
        let Some(ts) = parse_timestamp(raw) else {
            warn!(id = info.id, date_created = raw, "unparsable date_created");
            continue;
        };
        if earliest.is_none_or(|(e, _)| ts < e) {
            earliest = Some((ts, raw));
        }
        if latest.is_none_or(|(l, _, _)| ts > l) {
            latest = Some((ts, raw, rev.enabled.unwrap_or(false)));
        }
    }

    let live = latest.is_some_and(|(_, _, enabled)| enabled);
    let days = match (earliest, latest) {
        (Some((first, _)), Some((last, _, _))) => {
            let end = if live { now } else { last };
            (end - first).num_seconds() / SECONDS_PER_DAY
        }
        _ => 0,
    };

    LifecycleSummary {
        id: info.id,
        action: info.action,
        slug: if info.slug.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            info.slug
        },
        live,
        first: earliest.and_then(|(_, raw)| date_prefix(raw)).map(str::to_string),
        last: latest.and_then(|(_, raw, _)| date_prefix(raw)).map(str::to_string),
        days,
        revisions: revisions.len(),
    }
}

/// Day of a timestamp in the chosen timezone; falls back to the raw prefix
fn day_of(raw: &str, timezone: Timezone) -> Option<String> {
    match parse_timestamp(raw) {
        Some(ts) => Some(timezone.day_key(ts)),
        None => date_prefix(raw).map(str::to_string),
    }
}

/// Row for the `latest` listing; `None` when the recipe has no usable date
pub(crate) fn latest_row(recipe: &Recipe, timezone: Timezone) -> Option<LatestRow> {
    let Some(date) = recipe.date_created().and_then(|raw| day_of(raw, timezone)) else {
        warn!(id = recipe.id, "recipe has no latest_revision.date_created");
        return None;
    };
    Some(LatestRow {
        date,
        id: recipe.id,
        action: recipe.action_name().unwrap_or(UNKNOWN).to_string(),
        slug: recipe.slug().unwrap_or(PLACEHOLDER).to_string(),
    })
}

/// Remove newlines and spaces so expressions compare and print compactly
pub(crate) fn normalize_expression(expression: &str) -> String {
    expression
        .chars()
        .filter(|c| *c != '\n' && *c != ' ')
        .collect()
}

/// Outcome of inspecting one recipe for the extra-expressions listing
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ExpressionOutcome {
    Row(ExpressionRow),
    Skip,
    /// Missing required data; the walk stops here
    Stop,
}

pub(crate) fn expression_row(recipe: &Recipe, timezone: Timezone) -> ExpressionOutcome {
    let Some(date) = recipe.date_created().and_then(|raw| day_of(raw, timezone)) else {
        warn!(id = recipe.id, "recipe has no latest_revision.date_created, stopping");
        return ExpressionOutcome::Stop;
    };
    let action = recipe.action_name().unwrap_or("");
    if action == ACTION_HEARTBEAT {
        return ExpressionOutcome::Skip;
    }
    let expression = recipe
        .revision()
        .map(|rev| normalize_expression(rev.extra_expression()))
        .unwrap_or_default();
    if expression.is_empty() {
        return ExpressionOutcome::Skip;
    }
    ExpressionOutcome::Row(ExpressionRow {
        date,
        id: recipe.id,
        action: action.to_string(),
        expression,
    })
}
