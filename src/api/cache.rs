//! Disk-backed response cache
//!
//! One file per URL, named by the SHA-256 of the URL. Entries never expire
//! unless a TTL is configured.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use crate::error::AppError;

const ENTRY_EXTENSION: &str = "json";

/// Distinguishes concurrent writes of the same entry within one process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub(crate) struct ResponseCache {
    dir: PathBuf,
    ttl: Option<Duration>,
}

/// Cached file listing used by `cache stats`
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub(crate) path: PathBuf,
    pub(crate) size: u64,
}

/// Default cache directory: ~/.cache/normandy-stats/responses
pub(crate) fn default_cache_dir() -> Option<PathBuf> {
    let base = dirs::cache_dir().or_else(|| dirs::home_dir().map(|h| h.join(".cache")))?;
    Some(base.join("normandy-stats").join("responses"))
}

pub(crate) fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl ResponseCache {
    pub(crate) fn new(dir: PathBuf, ttl: Option<Duration>) -> Self {
        Self { dir, ttl }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", cache_key(url), ENTRY_EXTENSION))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Some(ttl) = self.ttl else {
            return true;
        };
        let age = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok());
        matches!(age, Some(age) if age <= ttl)
    }

    pub(crate) fn get(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.path_for(url);
        if !self.is_fresh(&path) {
            return None;
        }
        fs::read(&path).ok()
    }

    /// Write the body to a temporary file in the cache directory, then
    /// rename it over the entry. Readers see the old entry or the new one.
    pub(crate) fn put(&self, url: &str, body: &[u8]) -> Result<(), AppError> {
        let io_err = |path: &Path, source| AppError::Cache {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;

        let final_path = self.path_for(url);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self.dir.join(format!(
            "{}.{}.{}-{}.tmp",
            cache_key(url),
            ENTRY_EXTENSION,
            std::process::id(),
            seq
        ));
        fs::write(&tmp_path, body).map_err(|e| io_err(&tmp_path, e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_err(&final_path, e)
        })
    }

    pub(crate) fn entries(&self) -> Vec<CacheEntry> {
        let pattern = self.dir.join(format!("*.{ENTRY_EXTENSION}"));
        let mut entries = Vec::new();
        if let Ok(paths) = glob::glob(&pattern.to_string_lossy()) {
            for path in paths.flatten() {
                let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                entries.push(CacheEntry { path, size });
            }
        }
        entries
    }

    pub(crate) fn clear(&self) -> Result<usize, AppError> {
        let mut removed = 0;
        for entry in self.entries() {
            fs::remove_file(&entry.path).map_err(|source| AppError::Cache {
                path: entry.path.display().to_string(),
                source,
            })?;
            removed += 1;
        }
        Ok(removed)
    }
}
