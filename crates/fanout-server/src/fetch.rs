//! Outbound HTTP fetches.
//!
//! The [`Fetcher`] trait is the boundary to the network: the coordinator
//! only sees `fetch(url) -> bytes` operations that may fail.
//! Implementations must be safe to call concurrently with distinct URLs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

use crate::coordinator::WorkItem;

/// Errors that can occur while fetching a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// The request never produced a usable response.
    #[error("HTTP request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// URL the failed request targeted.
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } => url,
        }
    }
}

/// Performs one GET per call.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the response body.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    inner: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "GET request");

        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.inner.get(url).send().await.map_err(transport)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

/// Build one work item per URL. Each item yields the body size in bytes.
///
/// Failed fetches are logged with `url` and `error` fields before being
/// handed back to the coordinator as failures.
pub fn fetch_work_items(fetcher: &Arc<dyn Fetcher>, urls: &[String]) -> Vec<WorkItem<usize>> {
    urls.iter()
        .map(|url| {
            let fetcher = Arc::clone(fetcher);
            let url = url.clone();
            WorkItem::new(url.clone(), move || async move {
                match fetcher.fetch(&url).await {
                    Ok(body) => Ok(body.len()),
                    Err(e) => {
                        error!(url = %url, error = %e, "Error fetching URL");
                        Err(e)
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod stub {
    use std::collections::HashMap;

    use super::*;

    /// Scripted fetcher: each URL answers after a delay with either a body
    /// or a status code. Unscripted URLs fail at the transport level.
    #[derive(Debug, Default)]
    pub struct StubFetcher {
        routes: HashMap<String, (Duration, Result<Vec<u8>, u16>)>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ok(mut self, url: &str, delay_ms: u64, body: &[u8]) -> Self {
            self.routes.insert(
                url.to_string(),
                (Duration::from_millis(delay_ms), Ok(body.to_vec())),
            );
            self
        }

        pub fn status(mut self, url: &str, delay_ms: u64, status: u16) -> Self {
            self.routes
                .insert(url.to_string(), (Duration::from_millis(delay_ms), Err(status)));
            self
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            let Some((delay, answer)) = self.routes.get(url) else {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                });
            };

            tokio::time::sleep(*delay).await;
            answer.clone().map_err(|status| FetchError::Status {
                url: url.to_string(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stub::StubFetcher;
    use super::*;
    use crate::coordinator::Coordinator;

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            url: "https://example.test/invalid-url".to_string(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "HTTP request to https://example.test/invalid-url failed with status 404"
        );
        assert_eq!(err.url(), "https://example.test/invalid-url");
    }

    #[tokio::test]
    async fn test_stub_fetcher_answers() {
        let fetcher = StubFetcher::new().ok("a", 0, b"hello").status("b", 0, 500);

        assert_eq!(fetcher.fetch("a").await.unwrap(), b"hello".to_vec());
        assert!(matches!(
            fetcher.fetch("b").await,
            Err(FetchError::Status { status: 500, .. })
        ));
        assert!(matches!(
            fetcher.fetch("c").await,
            Err(FetchError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_one_invalid_url_among_four() {
        let fetcher: Arc<dyn Fetcher> = Arc::new(
            StubFetcher::new()
                .status("https://example.test/invalid-url", 10, 404)
                .ok("https://example.test/1MB.json", 30, &[0; 1024])
                .ok("https://example.test/5MB.json", 50, &[0; 4096])
                .ok("https://example.test/512KB.json", 20, &[0; 512]),
        );
        let urls = vec![
            "https://example.test/invalid-url".to_string(),
            "https://example.test/1MB.json".to_string(),
            "https://example.test/5MB.json".to_string(),
            "https://example.test/512KB.json".to_string(),
        ];

        let items = fetch_work_items(&fetcher, &urls);
        let summary = Coordinator::new("http_requests")
            .run_batch(items)
            .await
            .unwrap();

        assert_eq!(summary.failure_count(), 1);
        assert_eq!(summary.success_count(), 3);

        let failed = &summary.per_task()[0];
        assert_eq!(failed.name, "https://example.test/invalid-url");
        assert_eq!(
            failed.reason(),
            Some("HTTP request to https://example.test/invalid-url failed with status 404")
        );
        assert_eq!(summary.per_task()[2].outcome.value(), Some(&4096));
    }
}
