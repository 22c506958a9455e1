//! HTTP client core for the GitHub REST API.
//!
//! Every call goes through [`GitHubClient::request`], which:
//!
//! 1. waits for the quota to reset when the last response said it was spent;
//! 2. applies the optional per-second throttle;
//! 3. sends the request, retrying connection failures and 5xx responses with
//!    exponential backoff;
//! 4. on a rate-limit rejection, sleeps until reset and tries again, unless
//!    the wait exceeds `max_rate_limit_wait`.
//!
//! Non-success statuses other than 5xx are handed back to the caller;
//! [`GitHubClient::get_json`] turns them into [`GitHubError`]s.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::http::reqwest_transport::{DEFAULT_TIMEOUT, ReqwestTransport};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::retry::{RetryConfig, with_retry};

use super::error::{GitHubError, Result, short_error_message};
use super::rate_limit::{ApiRateLimiter, GITHUB_DEFAULT_RPS, RateLimitInfo};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
pub const USER_AGENT: &str = "dossier";

/// Longest sleep the client will take waiting for a quota reset.
pub const DEFAULT_MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(900);

/// Consecutive rate-limit rejections tolerated for a single request.
const MAX_RATE_LIMIT_ROUNDS: u32 = 3;

/// Query parameters, in the order they are appended to the URL.
pub type QueryParams<'a> = [(&'a str, String)];

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub retry: RetryConfig,
    /// Sleep through exhausted quotas instead of failing.
    pub respect_rate_limit: bool,
    pub max_rate_limit_wait: Duration,
    /// Proactive throttle; `None` disables it.
    pub requests_per_second: Option<u32>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
            respect_rate_limit: true,
            max_rate_limit_wait: DEFAULT_MAX_RATE_LIMIT_WAIT,
            requests_per_second: Some(GITHUB_DEFAULT_RPS),
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Things the client does that callers may want to surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    RetryScheduled {
        path: String,
        attempt: u32,
        delay: Duration,
        reason: String,
    },
    RateLimitWait {
        path: String,
        wait: Duration,
        reset_at: DateTime<Utc>,
    },
}

pub type ClientObserver = Arc<dyn Fn(ClientEvent) + Send + Sync>;

/// GitHub REST client. Cheap to clone; clones share rate-limit state.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    options: ClientOptions,
    rate_limit: Arc<Mutex<RateLimitInfo>>,
    limiter: Option<ApiRateLimiter>,
    observer: Option<ClientObserver>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.options.api_url)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Client over a reqwest transport with the configured timeout.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(options.timeout)?;
        Ok(Self::with_transport(Arc::new(transport), options))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>, options: ClientOptions) -> Self {
        let limiter = options.requests_per_second.map(ApiRateLimiter::new);
        Self {
            transport,
            options,
            rate_limit: Arc::new(Mutex::new(RateLimitInfo::default())),
            limiter,
            observer: None,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: ClientObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn is_authenticated(&self) -> bool {
        self.options.token.is_some()
    }

    /// Quota as of the last response.
    pub fn rate_limit(&self) -> RateLimitInfo {
        *self.rate_limit.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(super) fn store_rate_limit(&self, info: RateLimitInfo) {
        *self.rate_limit.lock().unwrap_or_else(|e| e.into_inner()) = info;
    }

    fn notify(&self, event: ClientEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }

    fn endpoint(&self, path: &str, params: &QueryParams<'_>) -> Result<String> {
        let base = self.options.api_url.trim_end_matches('/');
        let joined = format!("{base}/{}", path.trim_start_matches('/'));
        let mut url =
            url::Url::parse(&joined).map_err(|e| GitHubError::InvalidUrl(format!("{joined}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url.into())
    }

    fn build_request(&self, method: HttpMethod, url: String) -> HttpRequest {
        let request = HttpRequest::new(method, url)
            .with_header("Accept", ACCEPT_HEADER)
            .with_header("User-Agent", USER_AGENT);
        match &self.options.token {
            Some(token) => request.with_header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    /// Send `method path?params` and return the raw response.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &QueryParams<'_>,
    ) -> Result<HttpResponse> {
        let request = self.build_request(method, self.endpoint(path, params)?);
        let mut rounds = 0;

        loop {
            self.wait_for_quota(path).await;
            if let Some(limiter) = &self.limiter {
                limiter.wait().await;
            }

            let response = with_retry(
                || self.send_once(request.clone()),
                &self.options.retry,
                GitHubError::is_transient,
                |err, delay, attempt| {
                    let reason = short_error_message(err);
                    tracing::debug!(
                        path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %reason,
                        "Retrying GitHub request"
                    );
                    self.notify(ClientEvent::RetryScheduled {
                        path: path.to_string(),
                        attempt,
                        delay,
                        reason,
                    });
                },
            )
            .await?;

            if !is_rate_limit_rejection(&response) {
                return Ok(response);
            }

            rounds += 1;
            let info = self.rate_limit();
            let wait_secs = info.seconds_until_reset(Utc::now());
            let wait = Duration::from_secs(wait_secs + 1);
            if self.options.respect_rate_limit
                && rounds <= MAX_RATE_LIMIT_ROUNDS
                && wait < self.options.max_rate_limit_wait
            {
                self.sleep_until_reset(path, wait, info.reset_at).await;
                continue;
            }

            return Err(GitHubError::RateLimited {
                reset_at: info.reset_at,
                wait_secs,
            });
        }
    }

    async fn send_once(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.transport.send(request).await?;
        if let Some(info) = RateLimitInfo::from_headers(&response.headers) {
            self.store_rate_limit(info);
        }
        if response.is_server_error() {
            return Err(GitHubError::status(response.status, error_message(&response)));
        }
        Ok(response)
    }

    async fn wait_for_quota(&self, path: &str) {
        if !self.options.respect_rate_limit {
            return;
        }
        let info = self.rate_limit();
        if !info.is_exhausted() {
            return;
        }
        let wait = Duration::from_secs(info.seconds_until_reset(Utc::now()) + 1);
        if wait < self.options.max_rate_limit_wait {
            self.sleep_until_reset(path, wait, info.reset_at).await;
        }
    }

    async fn sleep_until_reset(&self, path: &str, wait: Duration, reset_at: DateTime<Utc>) {
        tracing::warn!(
            path,
            wait_secs = wait.as_secs(),
            %reset_at,
            "GitHub rate limit reached, waiting for reset"
        );
        self.notify(ClientEvent::RateLimitWait {
            path: path.to_string(),
            wait,
            reset_at,
        });
        tokio::time::sleep(wait).await;

        let mut info = self.rate_limit();
        info.remaining = info.limit;
        self.store_rate_limit(info);
    }

    /// GET and decode a JSON body; error statuses become [`GitHubError`]s.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams<'_>,
    ) -> Result<T> {
        let response = self.request(HttpMethod::Get, path, params).await?;
        let response = check_status(path, response)?;
        decode(path, &response)
    }

    /// Like [`get_json`](Self::get_json), with 404 mapped to `None`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams<'_>,
    ) -> Result<Option<T>> {
        match self.get_json(path, params).await {
            Ok(value) => Ok(Some(value)),
            Err(GitHubError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// A 403 or 429 whose body mentions the rate limit. Any other 429 is an
/// ordinary status error.
fn is_rate_limit_rejection(response: &HttpResponse) -> bool {
    matches!(response.status, 403 | 429) && response.text().to_lowercase().contains("rate limit")
}

/// The `message` field of a GitHub error body, or the raw body.
fn error_message(response: &HttpResponse) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match response.json::<ErrorBody>() {
        Ok(body) => body.message,
        Err(_) => response.text().chars().take(200).collect(),
    }
}

pub(crate) fn check_status(path: &str, response: HttpResponse) -> Result<HttpResponse> {
    match response.status {
        s if (200..300).contains(&s) => Ok(response),
        401 => Err(GitHubError::AuthRequired),
        404 => Err(GitHubError::not_found(path)),
        s => Err(GitHubError::status(s, error_message(&response))),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(path: &str, response: &HttpResponse) -> Result<T> {
    response.json().map_err(|source| GitHubError::Decode {
        path: path.to_string(),
        source,
    })
}
