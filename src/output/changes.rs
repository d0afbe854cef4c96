use comfy_table::{Cell, Color};
use serde_json::{Value, json};

use crate::core::{ChangeCounts, ChangeTable};
use crate::output::format::{
    ReportOptions, apply_order, create_styled_table, format_number, header_row, right_cell,
    styled_cell,
};

fn sorted_rows(table: &ChangeTable, options: ReportOptions) -> Vec<(&str, &str, ChangeCounts)> {
    let mut rows: Vec<(&str, &str, ChangeCounts)> = table
        .iter()
        .map(|((month, action), counts)| (month.as_str(), action.as_str(), *counts))
        .collect();
    apply_order(&mut rows, options.order);
    rows
}

fn count_cells(counts: &ChangeCounts, color: Option<Color>, bold: bool) -> Vec<Cell> {
    vec![
        right_cell(&format_number(counts.created), color, bold),
        right_cell(&format_number(counts.updated), color, bold),
        right_cell(&format_number(counts.paused), color, bold),
    ]
}

pub(crate) fn print_change_table(changes: &ChangeTable, options: ReportOptions) {
    let mut table = create_styled_table();
    table.set_header(header_row(
        &["Month", "Type", "Created", "Updated", "Paused"],
        options.use_color,
    ));

    let type_color = if options.use_color { Some(Color::Green) } else { None };
    let total_color = if options.use_color { Some(Color::Yellow) } else { None };

    let mut total = ChangeCounts::default();
    for (month, action, counts) in sorted_rows(changes, options) {
        total.add(&counts);
        let mut row = vec![Cell::new(month), styled_cell(action, type_color, false)];
        row.extend(count_cells(&counts, None, false));
        table.add_row(row);
    }

    let mut row = vec![styled_cell("TOTAL", total_color, true), Cell::new("")];
    row.extend(count_cells(&total, total_color, true));
    table.add_row(row);

    println!("{table}");
}

pub(crate) fn output_change_json(changes: &ChangeTable, options: ReportOptions) -> Value {
    let mut total = ChangeCounts::default();
    let rows: Vec<Value> = sorted_rows(changes, options)
        .into_iter()
        .map(|(month, action, counts)| {
            total.add(&counts);
            json!({
                "month": month,
                "type": action,
                "created": counts.created,
                "updated": counts.updated,
                "paused": counts.paused,
            })
        })
        .collect();
    json!({ "rows": rows, "total": total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SortOrder;

    #[test]
    fn json_rows_sorted_by_month_then_type() {
        let mut changes = ChangeTable::new();
        changes.insert(
            ("2020-02".into(), "opt-out-study".into()),
            ChangeCounts {
                created: 1,
                updated: 2,
                paused: 0,
            },
        );
        changes.insert(
            ("2020-01".into(), "show-heartbeat".into()),
            ChangeCounts {
                created: 0,
                updated: 1,
                paused: 1,
            },
        );
        changes.insert(
            ("2020-01".into(), "addon-study".into()),
            ChangeCounts {
                created: 3,
                updated: 0,
                paused: 0,
            },
        );

        let options = ReportOptions {
            order: SortOrder::Asc,
            use_color: false,
        };
        let value = output_change_json(&changes, options);
        let types: Vec<&str> = value["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["addon-study", "show-heartbeat", "opt-out-study"]);
        assert_eq!(value["total"]["created"], 4);
        assert_eq!(value["total"]["updated"], 3);
        assert_eq!(value["total"]["paused"], 1);
    }
}
