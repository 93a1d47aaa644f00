//! MOEX ISS HTTP transport.
//!
//! Blocking GETs with a fixed per-request timeout. Transient failures
//! (connect errors, timeouts, 429 and 5xx) are retried with exponential
//! backoff; anything else is reported immediately.

use super::source::{FetchError, JsonSource};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("bondlab/", env!("CARGO_PKG_VERSION"));
/// Upper bound on a single backoff sleep.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// HTTP client for the ISS JSON API.
pub struct IssClient {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl IssClient {
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Override the first backoff delay (doubles on every further attempt).
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    fn get_once(&self, url: &str, query: &[(String, String)]) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.json::<Value>().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(e.to_string())
            } else {
                FetchError::Decode(format!("{url}: {e}"))
            }
        })
    }
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

impl JsonSource for IssClient {
    fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, FetchError> {
        let mut attempt = 0;
        loop {
            debug!(url, ?query, attempt, "GET");
            match self.get_once(url, query) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = backoff(self.base_delay, attempt);
                    warn!(url, error = %e, retry_in_ms = delay.as_millis() as u64, "request failed, retrying");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`,
/// clamped to [`MAX_BACKOFF`].
fn backoff(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt))
        .map_or(MAX_BACKOFF, |d| d.min(MAX_BACKOFF))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff(base, 0), Duration::from_millis(500));
        assert_eq!(backoff(base, 1), Duration::from_secs(1));
        assert_eq!(backoff(base, 3), Duration::from_secs(4));
    }

    #[test]
    fn backoff_is_clamped_for_large_attempts() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff(base, 10), MAX_BACKOFF);
        assert_eq!(backoff(base, 32), MAX_BACKOFF);
        assert_eq!(backoff(base, u32::MAX), MAX_BACKOFF);
        assert_eq!(backoff(Duration::MAX, 2), MAX_BACKOFF);
    }
}
