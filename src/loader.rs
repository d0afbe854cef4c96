//! Report loaders
//!
//! Each loader drives the API (cursor walk, page fan-out or worker queue),
//! feeds decoded records through the aggregator and returns the report data
//! together with fetch statistics.

use chrono::{DateTime, Utc};
use std::ops::ControlFlow;
use std::time::Instant;
use tracing::{info, warn};

use crate::api::walker::decode_records;
use crate::api::{ApiClient, WalkSummary, WorkerPool, fetch_pages, walk};
use crate::consts::{ACTION_CONSOLE_LOG, ACTION_HEARTBEAT, UNKNOWN};
use crate::core::{
    ChangeTable, ExpressionOutcome, ExpressionRow, ExpressionSummary, FilterObjectStats,
    LatestRow, LifecycleSummary, RecipeFilter, admits, count_changes, expression_row, latest_row,
    merge_change_tables, parse_revisions, recipe_info, summarize_expressions,
    summarize_lifecycle, tally_filter_objects,
};
use crate::error::AppError;
use crate::utils::Timezone;

/// Everything a loader needs to talk to the API
pub(crate) struct LoadContext {
    pub(crate) client: ApiClient,
    base_url: String,
    pub(crate) workers: usize,
    pub(crate) queue_size: usize,
    pub(crate) page_size: usize,
    pub(crate) max_pages: Option<usize>,
    pub(crate) timezone: Timezone,
}

/// Loaded report data with fetch statistics
#[derive(Debug)]
pub(crate) struct LoadResult<T> {
    pub(crate) data: T,
    pub(crate) summary: WalkSummary,
    /// Wall time spent fetching and aggregating
    pub(crate) elapsed_ms: f64,
}

impl<T> LoadResult<T> {
    fn new(data: T, summary: WalkSummary, start: Instant) -> Self {
        Self {
            data,
            summary,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

impl LoadContext {
    pub(crate) fn new(client: ApiClient, base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client,
            base_url,
            workers: crate::consts::DEFAULT_WORKERS,
            queue_size: crate::consts::DEFAULT_QUEUE_SIZE,
            page_size: crate::consts::DEFAULT_PAGE_SIZE,
            max_pages: None,
            timezone: Timezone::default(),
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn page_url(&self, page: usize) -> String {
        format!("{}?page={page}", self.base_url)
    }

    pub(crate) fn ordered_url(&self, ordering: &str) -> String {
        format!("{}?ordering={ordering}", self.base_url)
    }

    pub(crate) fn history_url(&self, id: i64) -> String {
        format!("{}{id}/history/", self.base_url)
    }

    fn pool(&self) -> WorkerPool {
        WorkerPool::new(self.workers, self.queue_size)
    }

    /// Number of pages implied by the first page's `count`
    fn page_count(&self, count: Option<u64>) -> usize {
        let Some(count) = count else {
            warn!("first page has no count, processing it alone");
            return 1;
        };
        // server-supplied, saturate instead of overflowing
        let pages = usize::try_from(count).unwrap_or(usize::MAX) / self.page_size.max(1);
        let pages = pages.saturating_add(1);
        match self.max_pages {
            Some(limit) => pages.min(limit.max(1)),
            None => pages,
        }
    }
}

/// Filter-object usage per month. The first page decides the page count;
/// the remaining pages are fetched concurrently.
pub(crate) fn load_filter_objects(
    ctx: &LoadContext,
    filter: &RecipeFilter,
    split: bool,
) -> Result<LoadResult<FilterObjectStats>, AppError> {
    let start = Instant::now();

    info!(url = ctx.base_url(), "fetching first page");
    let first = ctx.client.get_page(ctx.base_url())?;
    let pages = ctx.page_count(first.count);

    let (recipes, skipped) = decode_records(first.results);
    let mut summary = WalkSummary {
        pages: 1,
        records: recipes.len(),
        skipped,
    };
    let mut stats = tally_filter_objects(&recipes, filter, split);

    let (rest, rest_summary) = fetch_pages(
        &ctx.client,
        2..=pages,
        |n| ctx.page_url(n),
        ctx.workers,
        |recipes| tally_filter_objects(&recipes, filter, split),
        FilterObjectStats::default,
        |mut acc, partial| {
            acc.merge(partial);
            acc
        },
    )?;
    stats.merge(rest);
    summary.add(rest_summary);

    Ok(LoadResult::new(stats, summary, start))
}

/// Created / updated / paused revision counts per month and action type
pub(crate) fn load_changes(
    ctx: &LoadContext,
    filter: &RecipeFilter,
) -> Result<LoadResult<ChangeTable>, AppError> {
    let start = Instant::now();

    let (walked, tables) = ctx.pool().run(
        |queue| {
            walk(&ctx.client, ctx.base_url(), ctx.max_pages, |recipe| {
                let action = recipe.action_name().unwrap_or(UNKNOWN).to_string();
                if queue.push((recipe.id, action)) {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            })
        },
        |(id, action): (i64, String)| {
            let url = ctx.history_url(id);
            match ctx.client.get_history(&url) {
                Ok(entries) => {
                    let revisions = parse_revisions(id, entries);
                    Some(count_changes(&revisions, &action, filter))
                }
                Err(e) => {
                    warn!(error = %e, "error fetching revisions");
                    None
                }
            }
        },
    );
    let summary = walked?;

    let mut table = ChangeTable::new();
    for partial in tables {
        merge_change_tables(&mut table, partial);
    }
    Ok(LoadResult::new(table, summary, start))
}

/// Filter-expression churn for recent non-heartbeat recipes, sorted by id
pub(crate) fn load_expression_summaries(
    ctx: &LoadContext,
    filter: &RecipeFilter,
) -> Result<LoadResult<Vec<ExpressionSummary>>, AppError> {
    let start = Instant::now();
    let filter = filter.clone().excluding(&[ACTION_HEARTBEAT, ACTION_CONSOLE_LOG]);

    let (walked, mut summaries) = ctx.pool().run(
        |queue| {
            walk(&ctx.client, &ctx.ordered_url("-id"), ctx.max_pages, |recipe| {
                if !admits(&filter, &recipe) || queue.push(recipe.id) {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            })
        },
        |id: i64| {
            let url = ctx.history_url(id);
            match ctx.client.get_history(&url) {
                Ok(entries) => Some(summarize_expressions(id, &parse_revisions(id, entries))),
                Err(e) => {
                    warn!(error = %e, "error fetching revisions");
                    None
                }
            }
        },
    );
    let summary = walked?;

    summaries.sort_by_key(|s| s.id);
    Ok(LoadResult::new(summaries, summary, start))
}

/// Recipes ordered by latest revision, as the API returns them
pub(crate) fn load_latest(ctx: &LoadContext) -> Result<LoadResult<Vec<LatestRow>>, AppError> {
    let start = Instant::now();
    let mut rows = Vec::new();

    let summary = walk(
        &ctx.client,
        &ctx.ordered_url("latest_revision"),
        ctx.max_pages,
        |recipe| {
            if let Some(row) = latest_row(&recipe, ctx.timezone) {
                rows.push(row);
            }
            ControlFlow::Continue(())
        },
    )?;

    Ok(LoadResult::new(rows, summary, start))
}

/// Non-heartbeat recipes that still need an extra filter expression
pub(crate) fn load_extra_expressions(
    ctx: &LoadContext,
) -> Result<LoadResult<Vec<ExpressionRow>>, AppError> {
    let start = Instant::now();
    let mut rows = Vec::new();

    let summary = walk(&ctx.client, ctx.base_url(), ctx.max_pages, |recipe| {
        match expression_row(&recipe, ctx.timezone) {
            ExpressionOutcome::Row(row) => {
                rows.push(row);
                ControlFlow::Continue(())
            }
            ExpressionOutcome::Skip => ControlFlow::Continue(()),
            ExpressionOutcome::Stop => ControlFlow::Break(()),
        }
    })?;

    Ok(LoadResult::new(rows, summary, start))
}

/// First/last revision and live state of recent recipes, sorted by id
pub(crate) fn load_lifecycles(
    ctx: &LoadContext,
    filter: &RecipeFilter,
    now: DateTime<Utc>,
) -> Result<LoadResult<Vec<LifecycleSummary>>, AppError> {
    let start = Instant::now();
    let filter = filter.clone().excluding(&[ACTION_CONSOLE_LOG]);

    let (walked, mut lifecycles) = ctx.pool().run(
        |queue| {
            walk(&ctx.client, &ctx.ordered_url("-id"), ctx.max_pages, |recipe| {
                if !admits(&filter, &recipe) || queue.push(recipe_info(&recipe)) {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            })
        },
        |info| {
            let url = ctx.history_url(info.id);
            let revisions = match ctx.client.get_history(&url) {
                Ok(entries) => parse_revisions(info.id, entries),
                Err(e) => {
                    warn!(error = %e, "error fetching revisions");
                    Vec::new()
                }
            };
            Some(summarize_lifecycle(info, &revisions, now))
        },
    );
    let summary = walked?;

    lifecycles.sort_by_key(|s| s.id);
    Ok(LoadResult::new(lifecycles, summary, start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResponseCache;
    use crate::core::ChangeCounts;
    use crate::core::types::RecipeGroup;

    const BASE: &str = "http://normandy.invalid/api/v3/recipe/";

    fn context(pages: &[(String, String)]) -> (tempfile::TempDir, LoadContext) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().to_path_buf(), None);
        for (url, body) in pages {
            cache.put(url, body.as_bytes()).unwrap();
        }
        let mut ctx = LoadContext::new(ApiClient::new(Some(cache), true), BASE);
        ctx.workers = 3;
        ctx.queue_size = 2;
        ctx.page_size = 2;
        (dir, ctx)
    }

    fn recipe_json(id: i64, action: &str, updated: &str, fo: bool) -> String {
        let fo = if fo { r#"[{"type": "channel"}]"# } else { "[]" };
        format!(
            r#"{{"id": {id}, "latest_revision": {{"updated": "{updated}", "date_created": "{updated}",
                "action": {{"name": "{action}"}}, "arguments": {{"slug": "s{id}"}},
                "extra_filter_expression": "", "filter_object": {fo}}}}}"#
        )
    }

    #[test]
    fn urls_are_built_from_normalized_base() {
        let ctx = LoadContext::new(ApiClient::new(None, true), "http://x.invalid/api");
        assert_eq!(ctx.base_url(), "http://x.invalid/api/");
        assert_eq!(ctx.page_url(3), "http://x.invalid/api/?page=3");
        assert_eq!(ctx.ordered_url("-id"), "http://x.invalid/api/?ordering=-id");
        assert_eq!(ctx.history_url(12), "http://x.invalid/api/12/history/");
    }

    #[test]
    fn page_count_follows_count_and_limit() {
        let (_dir, mut ctx) = context(&[]);
        ctx.page_size = 25;
        assert_eq!(ctx.page_count(Some(0)), 1);
        assert_eq!(ctx.page_count(Some(24)), 1);
        assert_eq!(ctx.page_count(Some(60)), 3);
        assert_eq!(ctx.page_count(None), 1);
        ctx.max_pages = Some(2);
        assert_eq!(ctx.page_count(Some(60)), 2);
    }

    #[test]
    fn page_count_saturates_on_huge_count() {
        let (_dir, mut ctx) = context(&[]);
        ctx.page_size = 1;
        assert_eq!(ctx.page_count(Some(u64::MAX)), usize::MAX);
        ctx.max_pages = Some(4);
        assert_eq!(ctx.page_count(Some(u64::MAX)), 4);
    }

    #[test]
    fn history_reports_fail_when_first_page_is_missing() {
        let (_dir, ctx) = context(&[]);
        let filter = RecipeFilter::new(Vec::new(), Timezone::default());
        let now = "2020-03-01T00:00:00Z".parse().unwrap();

        assert!(matches!(load_changes(&ctx, &filter), Err(AppError::CacheMiss { .. })));
        assert!(matches!(
            load_expression_summaries(&ctx, &filter),
            Err(AppError::CacheMiss { .. })
        ));
        assert!(matches!(
            load_lifecycles(&ctx, &filter, now),
            Err(AppError::CacheMiss { .. })
        ));
    }

    #[test]
    fn undecodable_revisions_do_not_drop_the_recipe() {
        let page = format!(
            r#"{{"next": null, "results": [{}]}}"#,
            recipe_json(5, "opt-out-study", "2019-02-02T00:00:00Z", false),
        );
        let history = r#"[{"date_created": "2019-01-01T00:00:00Z", "enabled": "yes"},
                          {"date_created": "2019-02-01T00:00:00Z", "enabled": true}]"#;
        let (_dir, ctx) = context(&[
            (BASE.to_string(), page.clone()),
            (format!("{BASE}?ordering=-id"), page),
            (format!("{BASE}5/history/"), history.to_string()),
        ]);
        let filter = RecipeFilter::new(vec![2019], Timezone::default());

        let changes = load_changes(&ctx, &filter).unwrap();
        let key = ("2019-02".to_string(), "opt-out-study".to_string());
        assert_eq!(changes.data.len(), 1);
        assert_eq!(
            changes.data[&key],
            ChangeCounts {
                created: 1,
                updated: 0,
                paused: 0,
            }
        );

        let now = "2019-03-01T00:00:00Z".parse().unwrap();
        let lifecycles = load_lifecycles(&ctx, &filter, now).unwrap();
        assert_eq!(lifecycles.data.len(), 1);
        assert_eq!(lifecycles.data[0].revisions, 1);
        assert!(lifecycles.data[0].live);
        assert_eq!(lifecycles.data[0].first.as_deref(), Some("2019-02-01"));
        assert_eq!(lifecycles.data[0].days, 28);
    }

    #[test]
    fn filter_objects_fans_out_over_pages() {
        let page1 = format!(
            r#"{{"count": 5, "next": "{BASE}?page=2", "results": [{}, {}]}}"#,
            recipe_json(1, "opt-out-study", "2019-01-02T00:00:00Z", true),
            recipe_json(2, "show-heartbeat", "2019-01-03T00:00:00Z", false),
        );
        let page2 = format!(
            r#"{{"count": 5, "next": null, "results": [{}, {}]}}"#,
            recipe_json(3, "opt-out-study", "2019-01-04T00:00:00Z", false),
            recipe_json(4, "console-log", "2019-01-04T00:00:00Z", true),
        );
        // page 3 is missing from the cache and gets skipped
        let (_dir, ctx) = context(&[(BASE.to_string(), page1), (format!("{BASE}?page=2"), page2)]);

        let filter = RecipeFilter::new(vec![2019], Timezone::default());
        let result = load_filter_objects(&ctx, &filter, true).unwrap();

        let experiments = &result.data.groups[&RecipeGroup::Experiments]["2019-01"];
        assert_eq!(experiments.total, 2);
        assert_eq!(experiments.fo_only, 1);
        assert_eq!(result.data.groups[&RecipeGroup::Heartbeat]["2019-01"].total, 1);
        assert_eq!(result.summary.pages, 2);
        assert_eq!(result.summary.records, 4);
    }

    #[test]
    fn filter_objects_first_page_failure_is_fatal() {
        let (_dir, ctx) = context(&[]);
        let filter = RecipeFilter::new(Vec::new(), Timezone::default());
        assert!(load_filter_objects(&ctx, &filter, true).is_err());
    }

    #[test]
    fn changes_walk_and_fetch_histories() {
        let page = format!(
            r#"{{"next": null, "results": [{}, {}, {}]}}"#,
            recipe_json(1, "opt-out-study", "2019-01-02T00:00:00Z", true),
            recipe_json(2, "addon-study", "2019-01-03T00:00:00Z", false),
            recipe_json(3, "addon-study", "2019-01-03T00:00:00Z", false),
        );
        let history1 = r#"[{"date_created": "2019-01-01T00:00:00Z", "enabled": true},
                           {"date_created": "2019-01-05T00:00:00Z", "enabled": false}]"#;
        let history2 = r#"[{"date_created": "2019-01-09T00:00:00Z", "enabled": false}]"#;
        let (_dir, ctx) = context(&[
            (BASE.to_string(), page),
            (format!("{BASE}1/history/"), history1.to_string()),
            (format!("{BASE}2/history/"), history2.to_string()),
        ]);

        let filter = RecipeFilter::new(Vec::new(), Timezone::default());
        let result = load_changes(&ctx, &filter).unwrap();
        let key = |action: &str| ("2019-01".to_string(), action.to_string());
        assert_eq!(
            result.data[&key("opt-out-study")],
            ChangeCounts {
                created: 1,
                updated: 0,
                paused: 1,
            }
        );
        assert_eq!(
            result.data[&key("addon-study")],
            ChangeCounts {
                created: 1,
                updated: 0,
                paused: 0,
            }
        );
        assert_eq!(result.summary.records, 3);
    }

    #[test]
    fn expression_summaries_skip_heartbeat_and_old_recipes() {
        let page = format!(
            r#"{{"next": null, "results": [{}, {}, {}]}}"#,
            recipe_json(3, "opt-out-study", "2020-02-02T00:00:00Z", true),
            recipe_json(2, "show-heartbeat", "2020-01-03T00:00:00Z", false),
            recipe_json(1, "opt-out-study", "2017-01-03T00:00:00Z", false),
        );
        let history = r#"[{"updated": "2020-02-01T00:00:00Z", "filter_expression": "a", "filter_object": []},
                          {"updated": "2020-02-02T00:00:00Z", "filter_expression": "b", "filter_object": []}]"#;
        let (_dir, ctx) = context(&[
            (format!("{BASE}?ordering=-id"), page),
            (format!("{BASE}3/history/"), history.to_string()),
        ]);
        let filter = RecipeFilter::new(vec![2019, 2020], Timezone::default());
        let result = load_expression_summaries(&ctx, &filter).unwrap();
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].id, 3);
        assert_eq!(result.data[0].expression_changes, 2);
    }

    #[test]
    fn lifecycles_include_recipes_without_history() {
        let page = format!(
            r#"{{"next": null, "results": [{}, {}]}}"#,
            recipe_json(2, "opt-out-study", "2020-02-02T00:00:00Z", true),
            recipe_json(1, "console-log", "2020-01-03T00:00:00Z", false),
        );
        let (_dir, ctx) = context(&[(format!("{BASE}?ordering=-id"), page)]);
        let filter = RecipeFilter::new(vec![2020], Timezone::default());
        let now = "2020-03-01T00:00:00Z".parse().unwrap();
        let result = load_lifecycles(&ctx, &filter, now).unwrap();
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].id, 2);
        assert_eq!(result.data[0].revisions, 0);
        assert_eq!(result.data[0].slug, "s2");
    }

    #[test]
    fn extra_expressions_stop_on_undated_recipe() {
        let page = format!(
            r#"{{"next": "{BASE}?page=2", "results": [
                {{"id": 1, "latest_revision": {{"date_created": "2019-01-01T00:00:00Z", "extra_filter_expression": "a == 1"}}}},
                {{"id": 2, "latest_revision": {{}}}},
                {{"id": 3, "latest_revision": {{"date_created": "2019-01-01T00:00:00Z", "extra_filter_expression": "b"}}}}
            ]}}"#
        );
        let (_dir, ctx) = context(&[(BASE.to_string(), page)]);
        let result = load_extra_expressions(&ctx).unwrap();
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].expression, "a==1");
    }

    #[test]
    fn latest_keeps_api_order() {
        let page = format!(
            r#"{{"next": null, "results": [{}, {}]}}"#,
            recipe_json(9, "addon-study", "2018-01-02T00:00:00Z", false),
            recipe_json(4, "opt-out-study", "2019-01-03T00:00:00Z", false),
        );
        let (_dir, ctx) = context(&[(format!("{BASE}?ordering=latest_revision"), page)]);
        let result = load_latest(&ctx).unwrap();
        let ids: Vec<i64> = result.data.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![9, 4]);
    }
}
