use chrono::Utc;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::api::{ApiClient, ResponseCache, default_cache_dir};
use crate::cli::{ALL_YEARS, CacheCommand, Cli, Commands, DEFAULT_REPORT_YEARS};
use crate::core::RecipeFilter;
use crate::error::AppError;
use crate::loader::{
    LoadContext, LoadResult, load_changes, load_expression_summaries, load_extra_expressions,
    load_filter_objects, load_latest, load_lifecycles,
};
use crate::output::{
    ReportOptions, output_change_json, output_expression_json, output_expression_rows_json,
    output_filter_object_json, output_latest_json, output_lifecycle_json, print_change_table,
    print_expression_rows, print_expression_table, print_filter_object_tables,
    print_latest_table, print_lifecycle_table, print_summary_line,
};
use crate::utils::{Timezone, parse_years};

const SECONDS_PER_HOUR: u64 = 3600;

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) loader: LoadContext,
    pub(crate) timezone: Timezone,
    pub(crate) options: ReportOptions,
}

impl CommandContext<'_> {
    fn filter(&self, years: &str) -> Result<RecipeFilter, AppError> {
        Ok(RecipeFilter::new(parse_years(years)?, self.timezone))
    }
}

/// Cache directory from the CLI or the platform default
fn cache_location(cli: &Cli) -> Option<PathBuf> {
    cli.cache_dir.clone().or_else(default_cache_dir)
}

fn response_cache(cli: &Cli) -> Option<ResponseCache> {
    if cli.no_cache {
        return None;
    }
    let Some(dir) = cache_location(cli) else {
        debug!("no cache directory available, caching disabled");
        return None;
    };
    let ttl = cli
        .cache_ttl
        .map(|hours| Duration::from_secs(hours.saturating_mul(SECONDS_PER_HOUR)));
    Some(ResponseCache::new(dir, ttl))
}

fn build_context(cli: &Cli) -> Result<CommandContext<'_>, AppError> {
    if cli.offline && cli.no_cache {
        return Err(AppError::InvalidOption {
            option: "--offline",
            reason: "cannot be combined with --no-cache".to_string(),
        });
    }
    let timezone = Timezone::parse(cli.timezone.as_deref())?;

    let client = ApiClient::new(response_cache(cli), cli.offline);
    let mut loader = LoadContext::new(client, &cli.base_url);
    loader.workers = cli.workers;
    loader.queue_size = cli.queue_size;
    loader.page_size = cli.page_size;
    loader.max_pages = cli.max_pages;
    loader.timezone = timezone;

    Ok(CommandContext {
        cli,
        loader,
        timezone,
        options: ReportOptions {
            order: cli.order,
            use_color: cli.use_color(),
        },
    })
}

/// Print a loaded report as JSON or as a table with the fetch summary
fn render<T>(
    ctx: &CommandContext<'_>,
    result: &LoadResult<T>,
    is_empty: bool,
    to_json: impl FnOnce(&T, ReportOptions) -> Value,
    print_table: impl FnOnce(&T, ReportOptions),
) {
    if ctx.cli.json {
        println!("{:#}", to_json(&result.data, ctx.options));
        return;
    }
    if is_empty {
        println!("No matching recipes found.");
    } else {
        print_table(&result.data, ctx.options);
    }
    print_summary_line(&result.summary, result.elapsed_ms, ctx.options.use_color);
}

fn handle_cache(cli: &Cli, command: CacheCommand) -> Result<(), AppError> {
    let Some(dir) = cache_location(cli) else {
        return Err(AppError::InvalidOption {
            option: "--cache-dir",
            reason: "no cache directory could be determined".to_string(),
        });
    };
    let cache = ResponseCache::new(dir, None);

    match command {
        CacheCommand::Path => {
            if cli.json {
                println!("{:#}", json!({ "dir": cache.dir() }));
            } else {
                println!("{}", cache.dir().display());
            }
        }
        CacheCommand::Stats => {
            let entries = cache.entries();
            let bytes: u64 = entries.iter().map(|e| e.size).sum();
            if cli.json {
                println!(
                    "{:#}",
                    json!({ "dir": cache.dir(), "entries": entries.len(), "bytes": bytes })
                );
            } else {
                println!(
                    "{} cached responses, {} bytes in {}",
                    entries.len(),
                    bytes,
                    cache.dir().display()
                );
            }
        }
        CacheCommand::Clear => {
            let removed = cache.clear()?;
            if cli.json {
                println!("{:#}", json!({ "removed": removed }));
            } else {
                println!("Removed {removed} cached responses");
            }
        }
    }
    Ok(())
}

pub(crate) fn run(cli: &Cli) -> Result<(), AppError> {
    cli.validate()?;

    if let Commands::Cache { command } = &cli.command {
        return handle_cache(cli, *command);
    }

    let ctx = build_context(cli)?;
    match &cli.command {
        Commands::FilterObjects { years, all_actions } => {
            let filter = ctx.filter(years.selection_or(DEFAULT_REPORT_YEARS))?;
            let result = load_filter_objects(&ctx.loader, &filter, !all_actions)?;
            render(
                &ctx,
                &result,
                result.data.is_empty(),
                output_filter_object_json,
                print_filter_object_tables,
            );
        }
        Commands::MonthlyChanges { years } => {
            let filter = ctx.filter(years.selection_or(ALL_YEARS))?;
            let result = load_changes(&ctx.loader, &filter)?;
            render(
                &ctx,
                &result,
                result.data.is_empty(),
                output_change_json,
                print_change_table,
            );
        }
        Commands::JexlChanges { years } => {
            let filter = ctx.filter(years.selection_or(DEFAULT_REPORT_YEARS))?;
            let result = load_expression_summaries(&ctx.loader, &filter)?;
            render(
                &ctx,
                &result,
                result.data.is_empty(),
                |rows, options| output_expression_json(rows, options),
                |rows, options| print_expression_table(rows, options),
            );
        }
        Commands::Latest => {
            let result = load_latest(&ctx.loader)?;
            render(
                &ctx,
                &result,
                result.data.is_empty(),
                |rows, options| output_latest_json(rows, options),
                |rows, options| print_latest_table(rows, options),
            );
        }
        Commands::ExtraExpressions => {
            let result = load_extra_expressions(&ctx.loader)?;
            render(
                &ctx,
                &result,
                result.data.is_empty(),
                |rows, options| output_expression_rows_json(rows, options),
                |rows, options| print_expression_rows(rows, options),
            );
        }
        Commands::Lifecycle { years } => {
            let filter = ctx.filter(years.selection_or(DEFAULT_REPORT_YEARS))?;
            let result = load_lifecycles(&ctx.loader, &filter, Utc::now())?;
            render(
                &ctx,
                &result,
                result.data.is_empty(),
                |rows, options| output_lifecycle_json(rows, options),
                |rows, options| print_lifecycle_table(rows, options),
            );
        }
        Commands::Cache { .. } => {}
    }
    Ok(())
}
