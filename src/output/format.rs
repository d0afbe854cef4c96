use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, TableComponent,
    modifiers::UTF8_SOLID_INNER_BORDERS, presets::UTF8_FULL,
};

use crate::api::WalkSummary;
use crate::cli::SortOrder;

/// Shared presentation options for every report
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReportOptions {
    pub(crate) order: SortOrder,
    pub(crate) use_color: bool,
}

pub(super) fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub(super) fn format_pct(pct: f64) -> String {
    format!("{pct:.1}%")
}

/// Percentage rounded to one decimal place for JSON output
pub(super) fn round_pct(pct: f64) -> f64 {
    (pct * 10.0).round() / 10.0
}

pub(super) fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Apply the requested ordering to rows already sorted ascending
pub(super) fn apply_order<T>(rows: &mut [T], order: SortOrder) {
    if matches!(order, SortOrder::Desc) {
        rows.reverse();
    }
}

pub(super) fn styled_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    let mut cell = Cell::new(text);
    if let Some(c) = color {
        cell = cell.fg(c);
    }
    if bold {
        cell = cell.add_attribute(Attribute::Bold);
    }
    cell
}

pub(super) fn header_cell(text: &str, use_color: bool) -> Cell {
    let mut cell = Cell::new(text).add_attribute(Attribute::Bold);
    if use_color {
        cell = cell.fg(Color::Cyan);
    }
    cell
}

pub(super) fn right_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    styled_cell(text, color, bold).set_alignment(CellAlignment::Right)
}

/// Header row from plain titles
pub(super) fn header_row(titles: &[&str], use_color: bool) -> Vec<Cell> {
    titles.iter().map(|t| header_cell(t, use_color)).collect()
}

/// Replace the double-line header separator (╞═╪═╡) with single-line (├─┼─┤)
fn normalize_header_separator(table: &mut Table) {
    table.set_style(TableComponent::HeaderLines, '─');
    table.set_style(TableComponent::LeftHeaderIntersection, '├');
    table.set_style(TableComponent::MiddleHeaderIntersections, '┼');
    table.set_style(TableComponent::RightHeaderIntersection, '┤');
}

/// Create a table with the standard preset, inner borders, and normalized header separator.
pub(super) fn create_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    normalize_header_separator(&mut table);
    table
}

pub(super) fn summary_text(summary: &WalkSummary) -> String {
    format!(
        "{} recipes from {} pages ({} skipped)",
        format_number(summary.records as u64),
        format_number(summary.pages as u64),
        format_number(summary.skipped as u64),
    )
}

/// Print the fetch summary line under a table
pub(crate) fn print_summary_line(summary: &WalkSummary, elapsed_ms: f64, use_color: bool) {
    let stats_text = summary_text(summary);
    if use_color {
        println!("\n  {stats_text} | \x1b[36m{elapsed_ms:.0}ms\x1b[0m\n");
    } else {
        println!("\n  {stats_text} | {elapsed_ms:.0}ms\n");
    }
}
