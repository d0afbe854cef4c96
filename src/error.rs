use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("Failed to fetch {url}: response code is {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to fetch {url}: empty body")]
    EmptyBody { url: String },

    #[error("No cached response for {url} (offline mode)")]
    CacheMiss { url: String },

    #[error("Failed to decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cache error at {path}: {source}")]
    Cache {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid timezone: {input}")]
    InvalidTimezone { input: String },

    #[error("Invalid year \"{input}\" (expected e.g. 2019 or 2019,2020)")]
    InvalidYear { input: String },

    #[error("Invalid value for {option}: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_display_status() {
        let e = AppError::Status {
            url: "https://example.test/api/".to_string(),
            status: 503,
        };
        assert_eq!(
            e.to_string(),
            "Failed to fetch https://example.test/api/: response code is 503"
        );
    }

    #[test]
    fn app_error_display_cache_miss() {
        let e = AppError::CacheMiss {
            url: "https://example.test/api/?page=2".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "No cached response for https://example.test/api/?page=2 (offline mode)"
        );
    }

    #[test]
    fn app_error_display_year() {
        let e = AppError::InvalidYear {
            input: "20x9".to_string(),
        };
        assert_eq!(
            e.to_string(),
            r#"Invalid year "20x9" (expected e.g. 2019 or 2019,2020)"#
        );
    }

    #[test]
    fn app_error_display_option() {
        let e = AppError::InvalidOption {
            option: "--workers",
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(e.to_string(), "Invalid value for --workers: must be at least 1");
    }

    #[test]
    fn app_error_decode_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = AppError::Decode {
            url: "u".to_string(),
            source,
        };
        assert!(std::error::Error::source(&e).is_some());
        assert!(e.to_string().starts_with("Failed to decode u: "));
    }
}
