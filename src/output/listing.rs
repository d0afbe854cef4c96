//! Flat recipe listings

use comfy_table::Cell;
use serde_json::{Value, json};

use crate::core::{ExpressionRow, LatestRow};
use crate::output::format::{
    ReportOptions, apply_order, create_styled_table, header_row, right_cell,
};

pub(crate) fn print_latest_table(rows: &[LatestRow], options: ReportOptions) {
    let mut table = create_styled_table();
    table.set_header(header_row(&["Date", "ID", "Action", "Slug"], options.use_color));

    let mut rows: Vec<&LatestRow> = rows.iter().collect();
    apply_order(&mut rows, options.order);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.date),
            right_cell(&row.id.to_string(), None, false),
            Cell::new(&row.action),
            Cell::new(&row.slug),
        ]);
    }

    println!("{table}");
}

pub(crate) fn output_latest_json(rows: &[LatestRow], options: ReportOptions) -> Value {
    let mut rows: Vec<&LatestRow> = rows.iter().collect();
    apply_order(&mut rows, options.order);
    json!(rows)
}

pub(crate) fn print_expression_rows(rows: &[ExpressionRow], options: ReportOptions) {
    let mut table = create_styled_table();
    table.set_header(header_row(
        &["Date", "ID", "Action", "Expression"],
        options.use_color,
    ));

    let mut rows: Vec<&ExpressionRow> = rows.iter().collect();
    apply_order(&mut rows, options.order);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.date),
            right_cell(&row.id.to_string(), None, false),
            Cell::new(&row.action),
            Cell::new(format!("[{}]", row.expression)),
        ]);
    }

    println!("{table}");
}

pub(crate) fn output_expression_rows_json(rows: &[ExpressionRow], options: ReportOptions) -> Value {
    let mut rows: Vec<&ExpressionRow> = rows.iter().collect();
    apply_order(&mut rows, options.order);
    json!(rows)
}
