use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::cache::ResponseCache;
use super::model::{HistoryBody, Page};
use crate::error::AppError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking API client with an optional disk cache in front of it
#[derive(Clone)]
pub(crate) struct ApiClient {
    agent: ureq::Agent,
    cache: Option<ResponseCache>,
    offline: bool,
}

impl ApiClient {
    pub(crate) fn new(cache: Option<ResponseCache>, offline: bool) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            cache,
            offline,
        }
    }

    /// Fetch a URL body, serving from the cache when possible
    pub(crate) fn get(&self, url: &str) -> Result<Vec<u8>, AppError> {
        if let Some(cache) = &self.cache
            && let Some(body) = cache.get(url)
        {
            debug!(url, "cache hit");
            return Ok(body);
        }

        if self.offline {
            return Err(AppError::CacheMiss {
                url: url.to_string(),
            });
        }

        let response = self.agent.get(url).call().map_err(|e| AppError::Http {
            url: url.to_string(),
            source: Box::new(e),
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(AppError::Status {
                url: url.to_string(),
                status,
            });
        }

        let mut body = response.into_body();
        let bytes = body.read_to_vec().map_err(|e| AppError::Http {
            url: url.to_string(),
            source: Box::new(e),
        })?;
        if bytes.is_empty() {
            return Err(AppError::EmptyBody {
                url: url.to_string(),
            });
        }

        if let Some(cache) = &self.cache
            && let Err(e) = cache.put(url, &bytes)
        {
            warn!(url, error = %e, "unable to cache body");
        }

        Ok(bytes)
    }

    pub(crate) fn get_page(&self, url: &str) -> Result<Page, AppError> {
        let body = self.get(url)?;
        serde_json::from_slice(&body).map_err(|source| AppError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Raw revision entries from a history endpoint
    pub(crate) fn get_history(&self, url: &str) -> Result<Vec<Value>, AppError> {
        let body = self.get(url)?;
        serde_json::from_slice::<HistoryBody>(&body)
            .map(HistoryBody::into_entries)
            .map_err(|source| AppError::Decode {
                url: url.to_string(),
                source,
            })
    }
}
