mod changes;
mod filter_objects;
mod format;
mod history;
mod listing;

pub(crate) use changes::{output_change_json, print_change_table};
pub(crate) use filter_objects::{output_filter_object_json, print_filter_object_tables};
pub(crate) use format::{ReportOptions, print_summary_line};
pub(crate) use history::{
    output_expression_json, output_lifecycle_json, print_expression_table, print_lifecycle_table,
};
pub(crate) use listing::{
    output_expression_rows_json, output_latest_json, print_expression_rows, print_latest_table,
};
