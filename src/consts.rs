/// Standard month key format: "2019-03"
pub(crate) const MONTH_FORMAT: &str = "%Y-%m";

/// Standard day format used in report rows: "2019-03-14"
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Public recipe collection endpoint
pub(crate) const DEFAULT_BASE_URL: &str = "https://normandy.cdn.mozilla.net/api/v3/recipe/";

/// Records per page served by the recipe endpoint
pub(crate) const DEFAULT_PAGE_SIZE: usize = 25;

pub(crate) const DEFAULT_WORKERS: usize = 8;

pub(crate) const DEFAULT_QUEUE_SIZE: usize = 10;

/// Action names with special handling in the reports
pub(crate) const ACTION_CONSOLE_LOG: &str = "console-log";
pub(crate) const ACTION_HEARTBEAT: &str = "show-heartbeat";

/// Fallback value when an action name or slug is unavailable
pub(crate) const UNKNOWN: &str = "unknown";

/// Placeholder for empty table cells (missing slug, missing dates)
pub(crate) const PLACEHOLDER: &str = "--";

/// Widest year range accepted by `--years`, counted inclusively
pub(crate) const MAX_YEAR_SPAN: i64 = 1000;
