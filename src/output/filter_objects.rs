//! Filter-object usage tables, one per recipe group

use comfy_table::{Cell, Color};
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::core::{FilterObjectStats, FoStats};
use crate::output::format::{
    ReportOptions, apply_order, create_styled_table, format_number, format_pct, header_row,
    right_cell, round_pct, styled_cell,
};

fn month_rows(months: &BTreeMap<String, FoStats>, options: ReportOptions) -> Vec<(&str, FoStats)> {
    let mut rows: Vec<(&str, FoStats)> = months.iter().map(|(m, s)| (m.as_str(), *s)).collect();
    apply_order(&mut rows, options.order);
    rows
}

fn stats_cells(stats: &FoStats, color: Option<Color>, bold: bool) -> Vec<Cell> {
    vec![
        right_cell(&format_number(stats.total), color, bold),
        right_cell(&format_number(stats.has_fo), color, bold),
        right_cell(&format_pct(stats.has_fo_pct()), color, bold),
        right_cell(&format_number(stats.fo_only), color, bold),
        right_cell(&format_pct(stats.fo_only_pct()), color, bold),
    ]
}

pub(crate) fn print_filter_object_tables(stats: &FilterObjectStats, options: ReportOptions) {
    let total_color = if options.use_color {
        Some(Color::Yellow)
    } else {
        None
    };

    for (group, months) in &stats.groups {
        let mut table = create_styled_table();
        table.set_header(header_row(
            &["Month", "Total", "Has FO", "%", "FO only", "%"],
            options.use_color,
        ));

        let mut total = FoStats::default();
        for (month, month_stats) in month_rows(months, options) {
            total.add(&month_stats);
            let mut row = vec![Cell::new(month)];
            row.extend(stats_cells(&month_stats, None, false));
            table.add_row(row);
        }

        let mut row = vec![styled_cell("TOTAL", total_color, true)];
        row.extend(stats_cells(&total, total_color, true));
        table.add_row(row);

        println!("\n  {}\n", group.title());
        println!("{table}");
    }
}

fn stats_json(stats: &FoStats) -> Value {
    json!({
        "total": stats.total,
        "has_fo": stats.has_fo,
        "has_fo_pct": round_pct(stats.has_fo_pct()),
        "fo_only": stats.fo_only,
        "fo_only_pct": round_pct(stats.fo_only_pct()),
    })
}

pub(crate) fn output_filter_object_json(
    stats: &FilterObjectStats,
    options: ReportOptions,
) -> Value {
    let groups: Vec<Value> = stats
        .groups
        .iter()
        .map(|(group, months)| {
            let mut total = FoStats::default();
            let rows: Vec<Value> = month_rows(months, options)
                .into_iter()
                .map(|(month, month_stats)| {
                    total.add(&month_stats);
                    let mut value = stats_json(&month_stats);
                    value["month"] = json!(month);
                    value
                })
                .collect();
            json!({
                "group": group,
                "months": rows,
                "total": stats_json(&total),
            })
        })
        .collect();
    json!({ "groups": groups })
}
