// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Error classification for the GitHub content API.
//!
//! Nothing here retries. The verdicts are advisory and meant for user
//! facing messages.

use std::str::FromStr;

use cosync_core::time::DateTime;
use cosync_core::{Error, ErrorKind, Result};
use http::{HeaderMap, StatusCode};
use serde::Deserialize;

const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Remaining calls under which [`RateLimit::check`] starts warning.
pub const LOW_REMAINING: u64 = 10;

/// How a failed GitHub call should be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Message for the user.
    pub message: String,
    /// Whether trying again later could succeed.
    pub retryable: bool,
    /// Minutes until the rate limit resets, for rate limited calls.
    pub wait_minutes: Option<i64>,
}

impl ErrorInfo {
    fn new(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            message: message.into(),
            retryable,
            wait_minutes: None,
        }
    }
}

fn header_value<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Minutes from `now` until the unix timestamp `reset`, rounded up.
///
/// A reset in the past gives 0.
fn minutes_until(reset: i64, now: DateTime) -> i64 {
    let millis = reset
        .saturating_mul(1000)
        .saturating_sub(now.timestamp_millis());
    millis.saturating_add(59_999).div_euclid(60_000).max(0)
}

/// Classify a non-success GitHub response.
///
/// A 403 is only a rate limit when `x-ratelimit-remaining` is `0`.
pub fn classify_status(
    status: StatusCode,
    headers: &HeaderMap,
    message: &str,
    now: DateTime,
) -> ErrorInfo {
    match status.as_u16() {
        401 => ErrorInfo::new("GitHub token is invalid or expired", false),
        403 => {
            let remaining = headers
                .get(X_RATELIMIT_REMAINING)
                .and_then(|v| v.to_str().ok());
            if remaining != Some("0") {
                return ErrorInfo::new("GitHub access denied", false);
            }

            let wait_minutes = header_value::<i64>(headers, X_RATELIMIT_RESET)
                .map(|reset| minutes_until(reset, now));
            ErrorInfo {
                message: match wait_minutes {
                    Some(m) => format!("GitHub API rate limit exceeded, retry in {m} minutes"),
                    None => "GitHub API rate limit exceeded".to_string(),
                },
                retryable: true,
                wait_minutes,
            }
        }
        404 => ErrorInfo::new("resource not found", false),
        409 => ErrorInfo::new("file conflict, sync the remote changes first", false),
        422 => ErrorInfo::new("invalid request", false),
        500 | 502 | 503 | 504 => ErrorInfo::new("GitHub server error, retry later", true),
        code => ErrorInfo::new(format!("GitHub API error ({code}): {message}"), false),
    }
}

/// Classify an error returned while talking to GitHub.
///
/// An [`Error`] keeps the status but not the response headers, so a 403
/// always reads as access denied here. Use [`classify_status`] with the
/// response headers to detect a rate limit.
pub fn classify_error(err: &Error, now: DateTime) -> ErrorInfo {
    match (err.kind(), err.status()) {
        (ErrorKind::HttpStatus, Some(status)) => {
            classify_status(status, &HeaderMap::new(), &err.to_string(), now)
        }
        (ErrorKind::Network, _) => ErrorInfo::new(format!("network request failed: {err}"), true),
        _ => ErrorInfo::new(format!("operation failed: {err}"), false),
    }
}

/// The `core` rate limit of the GitHub API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimit {
    /// Calls left in the current window.
    pub remaining: u64,
    /// Unix timestamp the window resets at.
    pub reset: i64,
}

/// Result of [`RateLimit::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitVerdict {
    /// Whether the next call should be made.
    pub can_proceed: bool,
    /// Minutes until the window resets, set when `can_proceed` is false.
    pub wait_minutes: Option<i64>,
    /// Message for the user, a warning when calls are running low.
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Deserialize)]
struct RateLimitResources {
    core: RateLimit,
}

impl RateLimit {
    /// Parse the body of `GET /rate_limit`.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let resp: RateLimitResponse = serde_json::from_slice(body)
            .map_err(|e| Error::unexpected("invalid rate limit response").with_source(e))?;
        Ok(resp.resources.core)
    }

    /// Read the rate limit headers of any GitHub response.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        Some(Self {
            remaining: header_value(headers, X_RATELIMIT_REMAINING)?,
            reset: header_value(headers, X_RATELIMIT_RESET)?,
        })
    }

    /// Decide whether another call should be made now.
    ///
    /// This never waits, callers surface the verdict instead.
    pub fn check(&self, now: DateTime) -> RateLimitVerdict {
        if self.remaining == 0 {
            let wait_minutes = minutes_until(self.reset, now);
            return RateLimitVerdict {
                can_proceed: false,
                wait_minutes: Some(wait_minutes),
                message: Some(format!(
                    "GitHub API rate limit exceeded, retry in {wait_minutes} minutes"
                )),
            };
        }

        RateLimitVerdict {
            can_proceed: true,
            wait_minutes: None,
            message: (self.remaining < LOW_REMAINING).then(|| {
                format!("GitHub API calls remaining: {}", self.remaining)
            }),
        }
    }
}
