//! Rate-limit bookkeeping.
//!
//! GitHub reports the remaining quota on every response. The client keeps
//! the latest [`RateLimitInfo`] and consults it before each request. The
//! [`ApiRateLimiter`] is an independent, proactive per-second throttle.

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::Serialize;

use crate::http::HttpHeaders;

/// Requests per second allowed by the proactive limiter by default.
pub const GITHUB_DEFAULT_RPS: u32 = 10;

/// Unauthenticated quota, used until the first response arrives.
const ANONYMOUS_LIMIT: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl Default for RateLimitInfo {
    fn default() -> Self {
        Self {
            limit: ANONYMOUS_LIMIT,
            remaining: ANONYMOUS_LIMIT,
            reset_at: DateTime::UNIX_EPOCH,
        }
    }
}

impl RateLimitInfo {
    /// Parse the `x-ratelimit-*` headers.
    ///
    /// Returns `None` when the response carries no rate-limit headers at all;
    /// individual missing values fall back to the anonymous defaults.
    pub fn from_headers(headers: &HttpHeaders) -> Option<Self> {
        let limit = parse_header::<u32>(headers, "x-ratelimit-limit");
        let remaining = parse_header::<u32>(headers, "x-ratelimit-remaining");
        let reset = parse_header::<i64>(headers, "x-ratelimit-reset");

        if limit.is_none() && remaining.is_none() && reset.is_none() {
            return None;
        }

        let defaults = Self::default();
        Some(Self {
            limit: limit.unwrap_or(defaults.limit),
            remaining: remaining.unwrap_or(defaults.remaining),
            reset_at: reset
                .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
                .unwrap_or(defaults.reset_at),
        })
    }

    pub fn from_epoch(limit: u32, remaining: u32, reset_epoch: i64) -> Self {
        Self {
            limit,
            remaining,
            reset_at: DateTime::from_timestamp(reset_epoch, 0).unwrap_or(DateTime::UNIX_EPOCH),
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Whole seconds until the window resets; zero once it has passed.
    #[must_use]
    pub fn seconds_until_reset(&self, now: DateTime<Utc>) -> u64 {
        (self.reset_at - now).num_seconds().max(0) as u64
    }
}

fn parse_header<T: std::str::FromStr>(headers: &HttpHeaders, name: &str) -> Option<T> {
    crate::http::header_get(headers, name).and_then(|v| v.trim().parse().ok())
}

type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Proactive throttle shared by clones of the client.
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter").finish_non_exhaustive()
    }
}

impl ApiRateLimiter {
    /// Zero is treated as one request per second.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            inner: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn headers(pairs: &[(&str, &str)]) -> HttpHeaders {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_anonymous_quota() {
        let info = RateLimitInfo::default();
        assert_eq!(info.limit, 60);
        assert_eq!(info.remaining, 60);
        assert_eq!(info.reset_at.timestamp(), 0);
        assert!(!info.is_exhausted());
    }

    #[test]
    fn parses_all_three_headers() {
        let info = RateLimitInfo::from_headers(&headers(&[
            ("X-RateLimit-Limit", "5000"),
            ("X-RateLimit-Remaining", "0"),
            ("X-RateLimit-Reset", "1700000000"),
        ]))
        .expect("headers present");
        assert_eq!(info.limit, 5000);
        assert!(info.is_exhausted());
        assert_eq!(info.reset_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn partial_headers_fall_back_per_field() {
        let info = RateLimitInfo::from_headers(&headers(&[("x-ratelimit-remaining", "12")]))
            .expect("one header is enough");
        assert_eq!(info.limit, 60);
        assert_eq!(info.remaining, 12);
        assert_eq!(info.reset_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn no_headers_yields_none() {
        assert!(RateLimitInfo::from_headers(&headers(&[("etag", "x")])).is_none());
    }

    #[test]
    fn seconds_until_reset_never_negative() {
        let now = Utc::now();
        let info = RateLimitInfo {
            limit: 60,
            remaining: 0,
            reset_at: now + Duration::seconds(90),
        };
        assert_eq!(info.seconds_until_reset(now), 90);
        assert_eq!(info.seconds_until_reset(now + Duration::seconds(200)), 0);
    }

    #[tokio::test]
    async fn limiter_allows_first_request_immediately() {
        let limiter = ApiRateLimiter::new(0);
        limiter.wait().await;
        let limiter = ApiRateLimiter::new(GITHUB_DEFAULT_RPS);
        limiter.wait().await;
    }
}
