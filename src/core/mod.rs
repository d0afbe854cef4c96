//! Core module - report data types and aggregation logic

mod aggregator;
pub(crate) mod types;

pub(crate) use aggregator::{
    ExpressionOutcome, admits, count_changes, expression_row, latest_row, parse_revisions,
    recipe_info, summarize_expressions, summarize_lifecycle, tally_filter_objects,
};
pub(crate) use types::{
    ChangeCounts, ChangeTable, ExpressionRow, ExpressionSummary, FilterObjectStats, FoStats,
    LatestRow, LifecycleSummary, RecipeFilter, merge_change_tables,
};
