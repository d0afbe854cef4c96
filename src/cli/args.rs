//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{Config, ConfigColorMode, ConfigSortOrder};
use crate::consts::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_QUEUE_SIZE, DEFAULT_WORKERS};
use crate::error::AppError;

use super::commands::Commands;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub(crate) enum SortOrder {
    /// Oldest first (default)
    #[default]
    Asc,
    /// Newest first
    Desc,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Parser)]
#[command(name = "normandy-stats")]
#[command(about = "Reports over the Normandy recipe API", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Recipe collection endpoint
    #[arg(long, global = true, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub(crate) base_url: String,

    /// Number of concurrent fetch workers
    #[arg(short, long, global = true, default_value_t = DEFAULT_WORKERS)]
    pub(crate) workers: usize,

    /// Capacity of the bounded work queue
    #[arg(long, global = true, default_value_t = DEFAULT_QUEUE_SIZE)]
    pub(crate) queue_size: usize,

    /// Records per page, used to compute the page count
    #[arg(long, global = true, default_value_t = DEFAULT_PAGE_SIZE)]
    pub(crate) page_size: usize,

    /// Stop walking after this many pages
    #[arg(long, global = true, value_name = "N")]
    pub(crate) max_pages: Option<usize>,

    /// Response cache directory
    #[arg(long, global = true, value_name = "DIR")]
    pub(crate) cache_dir: Option<PathBuf>,

    /// Neither read nor write the response cache
    #[arg(long, global = true)]
    pub(crate) no_cache: bool,

    /// Serve responses only from the cache
    #[arg(short = 'O', long, global = true)]
    pub(crate) offline: bool,

    /// Treat cached responses older than this many hours as missing
    #[arg(long, global = true, value_name = "HOURS")]
    pub(crate) cache_ttl: Option<u64>,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Sort order for report rows
    #[arg(short, long, global = true, value_enum, default_value = "asc")]
    pub(crate) order: SortOrder,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Timezone for month and day keys (e.g., "UTC", "local", "America/New_York")
    #[arg(long, global = true, value_name = "TZ")]
    pub(crate) timezone: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub(crate) debug: bool,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        // Config only fills values the CLI left at their default
        if !self.offline && config.offline {
            self.offline = true;
        }
        if !self.no_cache && config.no_cache {
            self.no_cache = true;
        }
        if !self.debug && config.debug {
            self.debug = true;
        }

        if self.base_url == DEFAULT_BASE_URL
            && let Some(ref url) = config.base_url
        {
            self.base_url = url.clone();
        }
        if self.workers == DEFAULT_WORKERS
            && let Some(workers) = config.workers
        {
            self.workers = workers;
        }
        if self.queue_size == DEFAULT_QUEUE_SIZE
            && let Some(queue_size) = config.queue_size
        {
            self.queue_size = queue_size;
        }
        if self.page_size == DEFAULT_PAGE_SIZE
            && let Some(page_size) = config.page_size
        {
            self.page_size = page_size;
        }

        if matches!(self.order, SortOrder::Asc)
            && let Some(ConfigSortOrder::Desc) = config.order
        {
            self.order = SortOrder::Desc;
        }
        if matches!(self.color, ColorMode::Auto) {
            match config.color {
                Some(ConfigColorMode::Always) => self.color = ColorMode::Always,
                Some(ConfigColorMode::Never) => self.color = ColorMode::Never,
                _ => {}
            }
        }

        if self.max_pages.is_none() {
            self.max_pages = config.max_pages;
        }
        if self.cache_dir.is_none() {
            self.cache_dir = config.cache_dir.clone();
        }
        if self.cache_ttl.is_none() {
            self.cache_ttl = config.cache_ttl_hours;
        }
        if self.timezone.is_none() {
            self.timezone = config.timezone.clone();
        }

        self
    }

    /// Reject option values the fetch layer cannot work with
    pub(crate) fn validate(&self) -> Result<(), AppError> {
        for (option, value) in [
            ("--workers", self.workers),
            ("--queue-size", self.queue_size),
            ("--page-size", self.page_size),
        ] {
            if value == 0 {
                return Err(AppError::InvalidOption {
                    option,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if self.max_pages == Some(0) {
            return Err(AppError::InvalidOption {
                option: "--max-pages",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(AppError::InvalidOption {
                option: "--base-url",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}
