//! Recipe API access: HTTP client, response cache, pagination and fan-out

pub(crate) mod cache;
pub(crate) mod client;
pub(crate) mod model;
pub(crate) mod pool;
pub(crate) mod walker;

pub(crate) use cache::{ResponseCache, default_cache_dir};
pub(crate) use client::ApiClient;
pub(crate) use model::{Recipe, Revision};
pub(crate) use pool::{WorkerPool, fetch_pages};
pub(crate) use walker::{WalkSummary, walk};
