//! Per-recipe history reports: expression churn and lifecycles

use comfy_table::{Cell, Color};
use serde_json::{Value, json};

use crate::consts::PLACEHOLDER;
use crate::core::{ExpressionSummary, LifecycleSummary};
use crate::output::format::{
    ReportOptions, apply_order, create_styled_table, format_number, header_row, right_cell,
    styled_cell, yes_no,
};

pub(crate) fn print_expression_table(summaries: &[ExpressionSummary], options: ReportOptions) {
    let mut table = create_styled_table();
    table.set_header(header_row(
        &["ID", "Action", "Revisions", "Last Revision", "FO Used", "Expr Changes"],
        options.use_color,
    ));

    let mut rows: Vec<&ExpressionSummary> = summaries.iter().collect();
    apply_order(&mut rows, options.order);

    let fo_color = if options.use_color { Some(Color::Green) } else { None };
    for summary in rows {
        let last = if summary.last_revision.is_empty() {
            PLACEHOLDER
        } else {
            summary.last_revision.as_str()
        };
        table.add_row(vec![
            right_cell(&summary.id.to_string(), None, false),
            Cell::new(&summary.action),
            right_cell(&format_number(summary.revisions as u64), None, false),
            Cell::new(last),
            styled_cell(
                yes_no(summary.filter_object_used),
                fo_color.filter(|_| summary.filter_object_used),
                false,
            ),
            right_cell(&format_number(summary.expression_changes as u64), None, false),
        ]);
    }

    println!("{table}");
}

pub(crate) fn output_expression_json(
    summaries: &[ExpressionSummary],
    options: ReportOptions,
) -> Value {
    let mut rows: Vec<&ExpressionSummary> = summaries.iter().collect();
    apply_order(&mut rows, options.order);
    json!(rows)
}

pub(crate) fn print_lifecycle_table(lifecycles: &[LifecycleSummary], options: ReportOptions) {
    let mut table = create_styled_table();
    table.set_header(header_row(
        &["ID", "Action", "Slug", "Live", "First", "Last", "Days", "Revisions"],
        options.use_color,
    ));

    let mut rows: Vec<&LifecycleSummary> = lifecycles.iter().collect();
    apply_order(&mut rows, options.order);

    let live_color = if options.use_color { Some(Color::Green) } else { None };
    for lifecycle in rows {
        table.add_row(vec![
            right_cell(&lifecycle.id.to_string(), None, false),
            Cell::new(&lifecycle.action),
            Cell::new(&lifecycle.slug),
            styled_cell(
                yes_no(lifecycle.live),
                live_color.filter(|_| lifecycle.live),
                lifecycle.live,
            ),
            Cell::new(lifecycle.first.as_deref().unwrap_or(PLACEHOLDER)),
            Cell::new(lifecycle.last.as_deref().unwrap_or(PLACEHOLDER)),
            right_cell(&lifecycle.days.to_string(), None, false),
            right_cell(&format_number(lifecycle.revisions as u64), None, false),
        ]);
    }

    println!("{table}");
}

pub(crate) fn output_lifecycle_json(
    lifecycles: &[LifecycleSummary],
    options: ReportOptions,
) -> Value {
    let mut rows: Vec<&LifecycleSummary> = lifecycles.iter().collect();
    apply_order(&mut rows, options.order);
    json!(rows)
}
