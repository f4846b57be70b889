//! HTTP fetching with exponential backoff retry logic.
//!
//! Every source adapter downloads its pages through the [`FetchText`] trait so
//! the transport can be decorated and, in tests, replaced.
//!
//! # Architecture
//!
//! - [`FetchText`]: Core trait defining an async "GET this URL as text"
//! - [`HttpFetcher`]: `reqwest`-backed implementation with browser-like headers
//! - [`RetryFetch`]: Decorator that adds retry logic to any `FetchText` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 2 retry attempts per request
//! - Only transport errors, `429` and `5xx` are retried; other statuses fail at once
//! - Exponential backoff starting at 500ms
//! - Maximum delay capped at 10 seconds
//! - Random jitter (0-250ms) added so parallel sources don't retry in lockstep

use rand::{rng, Rng};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Trait for async page retrieval.
///
/// Implementors fetch a URL and return the response body as text. Non-success
/// HTTP statuses must be reported as errors.
pub trait FetchText {
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>>;
}

/// Headers sent with every outbound request.
///
/// Several job boards serve an empty shell or a 403 to clients that don't
/// look like a browser.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-AU,en;q=0.9"));
    headers
}

/// `reqwest`-backed [`FetchText`] implementation.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with browser-like default headers and a per-request timeout.
    pub fn new(timeout: StdDuration) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FetchText for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            bytes = body.len(),
            "Fetched"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchText`] implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    /// The underlying fetcher to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: FetchText,
{
    /// Create a new retry wrapper around an existing [`FetchText`] implementation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let http = HttpFetcher::new(Duration::from_secs(20))?;
    /// let fetcher = RetryFetch::new(http, 2, Duration::from_millis(500));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(10),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

/// HTTP status carried by a fetch error, if the server answered at all.
fn error_status(e: &(dyn Error + 'static)) -> Option<u16> {
    e.downcast_ref::<reqwest::Error>()
        .and_then(reqwest::Error::status)
        .map(|s| s.as_u16())
}

/// Whether a failed fetch is worth repeating.
///
/// Transport errors, `429` and `5xx` are; any other status is the server's
/// final word on that URL.
fn is_retryable(status: Option<u16>) -> bool {
    match status {
        None => true,
        Some(code) => code == 429 || code >= 500,
    }
}

impl<T> RetryFetch<T> {
    fn backoff(&self, retry: usize) -> StdDuration {
        let delay = self
            .base_delay
            .saturating_mul(1 << (retry - 1).min(16))
            .min(self.max_delay);
        delay + StdDuration::from_millis(rng().random_range(0..=250))
    }
}

impl<T> FetchText for RetryFetch<T>
where
    T: FetchText,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let started = Instant::now();
        let mut retry = 0usize;

        loop {
            let e = match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };
            let status = error_status(&*e);

            if !is_retryable(status) {
                warn!(%url, ?status, error = %e, "Fetch rejected; not retrying");
                return Err(e);
            }
            if retry >= self.max_retries {
                error!(
                    %url,
                    ?status,
                    attempts = retry + 1,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Fetch failed after retries"
                );
                return Err(e);
            }

            retry += 1;
            let delay = self.backoff(retry);
            warn!(%url, ?status, retry, ?delay, error = %e, "Fetch failed; retrying");
            sleep(delay).await;
        }
    }
}
