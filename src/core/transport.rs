//! Blocking HTTP transport with base-URL resolution and a status-driven retry policy.

use crate::utils::error::{ApiError, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.3;
pub const RETRY_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];
/// Statuses whose `Retry-After` header replaces the computed backoff.
pub const RETRY_AFTER_STATUS_CODES: [u16; 3] = [413, 429, 503];
pub const BACKOFF_MAX: Duration = Duration::from_secs(120);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// When and how long to wait before re-sending a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub total: u32,
    pub backoff_factor: f64,
    pub status_forcelist: Vec<u16>,
    pub backoff_max: Duration,
    pub respect_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_FACTOR)
    }
}

impl RetryPolicy {
    pub fn new(total: u32, backoff_factor: f64) -> Self {
        Self {
            total,
            backoff_factor,
            status_forcelist: RETRY_STATUS_CODES.to_vec(),
            backoff_max: BACKOFF_MAX,
            respect_retry_after: true,
        }
    }

    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.status_forcelist.contains(&status.as_u16())
    }

    /// Status-based retries are limited to idempotent methods.
    pub fn is_retryable_method(&self, method: &Method) -> bool {
        [
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::TRACE,
        ]
        .contains(method)
    }

    /// Delay after `consecutive_errors` failures: none for the first retry,
    /// then `backoff_factor * 2^(n-1)` seconds, capped at `backoff_max`.
    pub fn backoff(&self, consecutive_errors: u32) -> Duration {
        if consecutive_errors <= 1 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(consecutive_errors - 1).unwrap_or(i32::MAX);
        let seconds = self.backoff_factor * 2f64.powi(exponent);
        let capped = seconds.min(self.backoff_max.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            Duration::ZERO
        }
    }

    fn delay_for(
        &self,
        consecutive_errors: u32,
        status: StatusCode,
        headers: &HeaderMap,
    ) -> Duration {
        if self.respect_retry_after && RETRY_AFTER_STATUS_CODES.contains(&status.as_u16()) {
            if let Some(delay) = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after)
            {
                return delay;
            }
        }
        self.backoff(consecutive_errors)
    }
}

/// Parses a `Retry-After` value given as delta-seconds or as an HTTP date.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let remaining = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(remaining.to_std().unwrap_or(Duration::ZERO))
}

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// The final response of a request, fully read so it can be inspected repeatedly.
#[derive(Debug, Clone)]
pub struct RecordedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    pub url: Url,
    pub elapsed: Duration,
}

impl RecordedResponse {
    fn capture(response: reqwest::blocking::Response, started: Instant) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.text()?;
        Ok(Self {
            status,
            headers,
            body,
            url,
            elapsed: started.elapsed(),
        })
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Anything outside 2xx is an error; redirects are followed before this point.
    pub fn error_for_status(&self) -> Result<()> {
        if !self.is_success() {
            return Err(ApiError::HttpStatus {
                status: self.status.as_u16(),
                url: self.url.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RequesterBuilder {
    base_url: Option<String>,
    timeout: Duration,
    headers: HeaderMap,
    retry: RetryPolicy,
}

impl Default for RequesterBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            headers: HeaderMap::new(),
            retry: RetryPolicy::default(),
        }
    }
}

impl RequesterBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn max_retries(mut self, total: u32) -> Self {
        self.retry.total = total;
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.retry.backoff_factor = factor;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<Requester> {
        let base_url = self
            .base_url
            .map(|raw| {
                Url::parse(&raw).map_err(|source| ApiError::InvalidUrl { value: raw, source })
            })
            .transpose()?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(self.headers)
            .build()?;

        Ok(Requester {
            base_url,
            timeout: self.timeout,
            retry: self.retry,
            client: Some(client),
        })
    }
}

/// Session wrapper. The connection pool is released by [`Requester::close`] or on drop.
#[derive(Debug)]
pub struct Requester {
    base_url: Option<Url>,
    timeout: Duration,
    retry: RetryPolicy,
    client: Option<Client>,
}

impl Requester {
    pub fn builder() -> RequesterBuilder {
        RequesterBuilder::default()
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    /// Absolute endpoints pass through; relative ones are joined onto the base URL.
    pub fn build_url(&self, endpoint: &str) -> Result<Url> {
        let absolute = endpoint.starts_with("http://") || endpoint.starts_with("https://");
        let joined = match (&self.base_url, absolute) {
            (Some(base), false) => base.join(endpoint),
            _ => Url::parse(endpoint),
        };
        joined.map_err(|source| ApiError::InvalidUrl {
            value: endpoint.to_string(),
            source,
        })
    }

    pub fn get(&self, endpoint: &str) -> Result<RecordedResponse> {
        self.request(Method::GET, endpoint, &RequestOptions::default())
    }

    pub fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<RecordedResponse> {
        let client = self.client.as_ref().ok_or(ApiError::TransportClosed)?;
        let url = self.build_url(endpoint)?;
        let timeout = options.timeout.unwrap_or(self.timeout);
        let idempotent = self.retry.is_retryable_method(&method);
        let mut retries = 0u32;

        loop {
            tracing::debug!(%method, %url, attempt = retries + 1, "Sending request");

            let mut request = client
                .request(method.clone(), url.clone())
                .headers(options.headers.clone())
                .timeout(timeout);
            if !options.query.is_empty() {
                request = request.query(&options.query);
            }

            let started = Instant::now();
            match request.send() {
                Ok(response) => {
                    let status = response.status();
                    tracing::debug!(status = status.as_u16(), %url, "Received response");

                    if !(idempotent && self.retry.is_retryable_status(status)) {
                        return RecordedResponse::capture(response, started);
                    }
                    if retries >= self.retry.total {
                        return Err(ApiError::RetriesExhausted {
                            url: url.to_string(),
                            status: status.as_u16(),
                            attempts: retries + 1,
                        });
                    }

                    retries += 1;
                    let delay = self.retry.delay_for(retries, status, response.headers());
                    tracing::warn!(
                        status = status.as_u16(),
                        %url,
                        retry = retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Retryable status, backing off"
                    );
                    std::thread::sleep(delay);
                }
                Err(err)
                    if (err.is_connect() || (idempotent && err.is_timeout()))
                        && retries < self.retry.total =>
                {
                    retries += 1;
                    let delay = self.retry.backoff(retries);
                    tracing::warn!(error = %err, %url, retry = retries, "Transport error, retrying");
                    std::thread::sleep(delay);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("Closed HTTP session");
        }
    }
}

impl Drop for Requester {
    fn drop(&mut self) {
        self.close();
    }
}
