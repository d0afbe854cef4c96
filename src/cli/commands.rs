//! CLI subcommand definitions
//!
//! One subcommand per report, plus cache maintenance.

use clap::{Args, Subcommand};

/// Year restriction shared by the reports that filter on `updated`
#[derive(Debug, Clone, Args)]
pub(crate) struct YearArgs {
    /// Years to include: "2019", "2019,2020", "2018-2020" or "all"
    #[arg(short, long, value_name = "YEARS")]
    pub(crate) years: Option<String>,
}

impl YearArgs {
    /// The requested years, or `default` when none were given
    pub(crate) fn selection_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.years.as_deref().unwrap_or(default)
    }
}

/// Main CLI commands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Monthly filter-object usage (total / has FO / FO only)
    FilterObjects {
        #[command(flatten)]
        years: YearArgs,
        /// Count all actions in one table instead of splitting heartbeat
        #[arg(long)]
        all_actions: bool,
    },
    /// Created / updated / paused revisions per month and action type
    MonthlyChanges {
        #[command(flatten)]
        years: YearArgs,
    },
    /// Filter-expression changes per recipe
    JexlChanges {
        #[command(flatten)]
        years: YearArgs,
    },
    /// Recipes ordered by latest revision
    Latest,
    /// Recipes that still carry an extra filter expression
    ExtraExpressions,
    /// First/last revision, live state and age per recipe
    Lifecycle {
        #[command(flatten)]
        years: YearArgs,
    },
    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub(crate) enum CacheCommand {
    /// Print the cache directory
    Path,
    /// Number and total size of cached responses
    Stats,
    /// Delete all cached responses
    Clear,
}

/// Default year selection per report
pub(crate) const DEFAULT_REPORT_YEARS: &str = "2019,2020";
pub(crate) const ALL_YEARS: &str = "all";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn parses_report_subcommands() {
        let cli =
            Cli::try_parse_from(["normandy-stats", "filter-objects", "--all-actions"]).unwrap();
        match cli.command {
            Commands::FilterObjects { years, all_actions } => {
                assert!(all_actions);
                assert_eq!(years.selection_or(DEFAULT_REPORT_YEARS), "2019,2020");
            }
            _ => panic!("wrong command"),
        }

        let cli =
            Cli::try_parse_from(["normandy-stats", "monthly-changes", "-y", "2018-2019"]).unwrap();
        match cli.command {
            Commands::MonthlyChanges { years } => {
                assert_eq!(years.selection_or(ALL_YEARS), "2018-2019")
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn parses_cache_subcommands() {
        let cli = Cli::try_parse_from(["normandy-stats", "cache", "clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cache {
                command: CacheCommand::Clear
            }
        ));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["normandy-stats"]).is_err());
    }
}
