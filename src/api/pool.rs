//! Concurrent fetching
//!
//! Two shapes of fan-out are used by the reports:
//! - page fan-out, when the page URLs are known up front (rayon pool, map/reduce)
//! - a bounded job queue fed by a cursor walk on the calling thread, drained
//!   by a fixed set of worker threads

use rayon::prelude::*;
use std::ops::RangeInclusive;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Mutex, PoisonError};
use std::thread;
use tracing::{info, warn};

use super::client::ApiClient;
use super::model::Recipe;
use super::walker::{WalkSummary, decode_records};
use crate::error::AppError;

/// Fetch pages `pages` concurrently on a pool of `workers` threads, building
/// each URL with `page_url` only when a worker picks the page up.
/// Each page is reduced to a partial result with `per_page`; partials are
/// merged with `reduce`. Pages that fail to fetch are logged and dropped.
pub(crate) fn fetch_pages<T, U, F, I, R>(
    client: &ApiClient,
    pages: RangeInclusive<usize>,
    page_url: U,
    workers: usize,
    per_page: F,
    init: I,
    reduce: R,
) -> Result<(T, WalkSummary), AppError>
where
    T: Send,
    U: Fn(usize) -> String + Send + Sync,
    F: Fn(Vec<Recipe>) -> T + Send + Sync,
    I: Fn() -> T + Send + Sync,
    R: Fn(T, T) -> T + Send + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()?;

    let merged = pool.install(|| {
        pages
            .into_par_iter()
            .filter_map(|n| {
                let url = page_url(n);
                match client.get_page(&url) {
                    Ok(page) => {
                        info!(url = %url, "processing page");
                        let (recipes, skipped) = decode_records(page.results);
                        let summary = WalkSummary {
                            pages: 1,
                            records: recipes.len(),
                            skipped,
                        };
                        Some((per_page(recipes), summary))
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping page");
                        None
                    }
                }
            })
            .reduce(
                || (init(), WalkSummary::default()),
                |(acc, mut acc_summary), (partial, summary)| {
                    acc_summary.add(summary);
                    (reduce(acc, partial), acc_summary)
                },
            )
    });

    Ok(merged)
}

/// Producer side of a [`WorkerPool`] queue
pub(crate) struct JobQueue<J> {
    tx: SyncSender<J>,
}

impl<J> JobQueue<J> {
    /// Enqueue a job, blocking while the queue is full.
    /// Returns false if no worker is left to receive it.
    pub(crate) fn push(&self, job: J) -> bool {
        self.tx.send(job).is_ok()
    }
}

/// Fixed-size pool of worker threads fed through a bounded queue
#[derive(Debug, Clone, Copy)]
pub(crate) struct WorkerPool {
    workers: usize,
    queue_size: usize,
}

impl WorkerPool {
    pub(crate) fn new(workers: usize, queue_size: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue_size: queue_size.max(1),
        }
    }

    /// Run `produce` on the calling thread while workers apply `work` to
    /// every queued job. The queue is closed when `produce` returns; workers
    /// drain what is left and exit. Results come back in completion order.
    pub(crate) fn run<J, R, T, P, W>(&self, produce: P, work: W) -> (T, Vec<R>)
    where
        J: Send,
        R: Send,
        P: FnOnce(&JobQueue<J>) -> T,
        W: Fn(J) -> Option<R> + Sync,
    {
        let (tx, rx) = sync_channel::<J>(self.queue_size);
        let rx = Mutex::new(rx);
        let results = Mutex::new(Vec::new());

        let produced = thread::scope(|scope| {
            for _ in 0..self.workers {
                scope.spawn(|| worker_loop(&rx, &results, &work));
            }
            let queue = JobQueue { tx };
            let produced = produce(&queue);
            drop(queue);
            produced
        });

        let results = results
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (produced, results)
    }
}

fn worker_loop<J, R, W>(rx: &Mutex<Receiver<J>>, results: &Mutex<Vec<R>>, work: &W)
where
    W: Fn(J) -> Option<R>,
{
    loop {
        let job = {
            let guard = rx.lock().unwrap_or_else(PoisonError::into_inner);
            guard.recv()
        };
        // closed and drained
        let Ok(job) = job else {
            break;
        };
        if let Some(result) = work(job) {
            results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(result);
        }
    }
}
