//! Cursor walk over the paginated recipe collection

use std::ops::ControlFlow;

use serde_json::Value;
use tracing::{info, warn};

use super::client::ApiClient;
use super::model::Recipe;
use crate::error::AppError;

/// Counters reported after a walk or page fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WalkSummary {
    pub(crate) pages: usize,
    pub(crate) records: usize,
    pub(crate) skipped: usize,
}

impl WalkSummary {
    pub(crate) fn add(&mut self, other: WalkSummary) {
        self.pages += other.pages;
        self.records += other.records;
        self.skipped += other.skipped;
    }
}

/// Decode page records one by one, dropping the ones that do not decode.
/// Returns the decoded recipes and the number skipped.
pub(crate) fn decode_records(results: Vec<Value>) -> (Vec<Recipe>, usize) {
    let mut recipes = Vec::with_capacity(results.len());
    let mut skipped = 0;
    for value in results {
        match serde_json::from_value::<Recipe>(value) {
            Ok(recipe) => recipes.push(recipe),
            Err(e) => {
                warn!(error = %e, "skipping undecodable record");
                skipped += 1;
            }
        }
    }
    (recipes, skipped)
}

/// Walk pages from `start` following `next` until the cursor runs out,
/// `max_pages` is reached, or the handler breaks.
///
/// Only a failure on the first page is returned as an error; a later page
/// that cannot be fetched ends the walk.
pub(crate) fn walk<F>(
    client: &ApiClient,
    start: &str,
    max_pages: Option<usize>,
    mut handler: F,
) -> Result<WalkSummary, AppError>
where
    F: FnMut(Recipe) -> ControlFlow<()>,
{
    let mut summary = WalkSummary::default();
    let mut next = Some(start.to_string());

    while let Some(url) = next.take() {
        if let Some(limit) = max_pages
            && summary.pages >= limit
        {
            info!(limit, "page limit reached");
            break;
        }

        info!(url = %url, "fetching page");
        let page = match client.get_page(&url) {
            Ok(page) => page,
            Err(e) if summary.pages == 0 => return Err(e),
            Err(e) => {
                warn!(error = %e, "stopping walk");
                break;
            }
        };
        summary.pages += 1;
        next = page.next_url().map(str::to_string);

        let (recipes, skipped) = decode_records(page.results);
        summary.skipped += skipped;
        for recipe in recipes {
            summary.records += 1;
            if handler(recipe).is_break() {
                return Ok(summary);
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cache::ResponseCache;

    const BASE: &str = "http://normandy.invalid/api/v3/recipe/";

    fn offline_client(pages: &[(&str, &str)]) -> (tempfile::TempDir, ApiClient) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().to_path_buf(), None);
        for (url, body) in pages {
            cache.put(url, body.as_bytes()).unwrap();
        }
        (dir, ApiClient::new(Some(cache), true))
    }

    fn two_pages() -> Vec<(&'static str, &'static str)> {
        vec![
            (
                BASE,
                r#"{"count": 3, "next": "http://normandy.invalid/api/v3/recipe/?page=2",
                    "results": [{"id": 1}, {"id": 2}]}"#,
            ),
            (
                "http://normandy.invalid/api/v3/recipe/?page=2",
                r#"{"count": 3, "next": null, "results": [{"id": 3}]}"#,
            ),
        ]
    }

    #[test]
    fn follows_cursor_to_the_end() {
        let (_dir, client) = offline_client(&two_pages());
        let mut ids = Vec::new();
        let summary = walk(&client, BASE, None, |r| {
            ids.push(r.id);
            ControlFlow::Continue(())
        })
        .unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            summary,
            WalkSummary {
                pages: 2,
                records: 3,
                skipped: 0
            }
        );
    }

    #[test]
    fn handler_break_stops_walk() {
        let (_dir, client) = offline_client(&two_pages());
        let mut ids = Vec::new();
        walk(&client, BASE, None, |r| {
            ids.push(r.id);
            if r.id == 1 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn max_pages_limits_walk() {
        let (_dir, client) = offline_client(&two_pages());
        let summary = walk(&client, BASE, Some(1), |_| ControlFlow::Continue(())).unwrap();
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.records, 2);
    }

    #[test]
    fn first_page_failure_is_fatal() {
        let (_dir, client) = offline_client(&[]);
        assert!(walk(&client, BASE, None, |_| ControlFlow::Continue(())).is_err());
    }

    #[test]
    fn later_page_failure_ends_walk() {
        let pages = vec![(
            BASE,
            r#"{"next": "http://normandy.invalid/api/v3/recipe/?page=2", "results": [{"id": 1}]}"#,
        )];
        let (_dir, client) = offline_client(&pages);
        let summary = walk(&client, BASE, None, |_| ControlFlow::Continue(())).unwrap();
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.records, 1);
    }

    #[test]
    fn bad_records_are_skipped() {
        let pages = vec![(
            BASE,
            r#"{"next": null, "results": [{"id": 1}, {"no_id": true}, {"id": "x"}]}"#,
        )];
        let (_dir, client) = offline_client(&pages);
        let summary = walk(&client, BASE, None, |_| ControlFlow::Continue(())).unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(summary.skipped, 2);
    }
}
