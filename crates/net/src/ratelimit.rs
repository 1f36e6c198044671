//! Code host rate-limit tracking
//!
//! Every response carries `x-ratelimit-*` headers. Once the remaining
//! budget reaches zero the gate closes and all callers sharing it sleep
//! until the advertised reset time.

use patron_errors::NetworkError;
use reqwest::header::HeaderMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Rate-limit budget as reported by the code host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: u64,
    /// Reset time in seconds since the Unix epoch
    pub reset_epoch_secs: f64,
}

impl RateLimit {
    /// Parse rate-limit headers; `None` when remaining or reset is absent
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_str(headers, REMAINING_HEADER)?.parse::<u64>().ok()?;
        let reset_epoch_secs = header_str(headers, RESET_HEADER)?.parse::<f64>().ok()?;
        let limit = header_str(headers, LIMIT_HEADER).and_then(|v| v.parse().ok());
        Some(Self {
            limit,
            remaining,
            reset_epoch_secs,
        })
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining < 1
    }

    /// Time left until reset, measured against the wall clock
    #[must_use]
    pub fn delay_until_reset(&self, now: SystemTime) -> Duration {
        let now_secs = now
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64());
        let remaining = self.reset_epoch_secs - now_secs;
        if remaining.is_finite() && remaining > 0.0 {
            Duration::from_secs_f64(remaining)
        } else {
            Duration::ZERO
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

/// Shared pause point for requests against one code host
#[derive(Debug)]
pub struct RateLimitGate {
    resume_at: Mutex<Option<Instant>>,
    max_wait: Duration,
}

impl RateLimitGate {
    #[must_use]
    pub fn new(max_wait: Duration) -> Self {
        Self {
            resume_at: Mutex::new(None),
            max_wait,
        }
    }

    /// Sleep until the gate is open
    pub async fn wait(&self) {
        loop {
            let deadline = *self
                .resume_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match deadline {
                Some(at) if at > Instant::now() => tokio::time::sleep_until(at).await,
                _ => return,
            }
        }
    }

    /// Close the gate until the limit resets. Returns the applied delay.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::RateLimitWaitExceeded`, leaving the gate as it
    /// was, when the reset is further away than the maximum wait.
    pub fn pause_until_reset(&self, limit: &RateLimit) -> Result<Duration, NetworkError> {
        let delay = limit.delay_until_reset(SystemTime::now());
        self.pause_within_limit(delay)?;
        Ok(delay)
    }

    /// Close the gate for `delay` unless it exceeds the maximum wait
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::RateLimitWaitExceeded` when `delay` is longer
    /// than the maximum wait.
    pub fn pause_within_limit(&self, delay: Duration) -> Result<(), NetworkError> {
        if delay > self.max_wait {
            return Err(NetworkError::RateLimitWaitExceeded {
                wait_secs: whole_secs_rounded_up(delay),
                max_secs: self.max_wait.as_secs(),
            });
        }
        self.pause_for(delay);
        Ok(())
    }

    /// Close the gate for a fixed duration
    pub fn pause_for(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        let target = Instant::now() + delay;
        let mut resume_at = self
            .resume_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // never shorten an existing pause
        if resume_at.is_none_or(|current| current < target) {
            *resume_at = Some(target);
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.resume_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|at| at > Instant::now())
    }
}

fn whole_secs_rounded_up(delay: Duration) -> u64 {
    delay.as_secs() + u64::from(delay.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(remaining: &str, reset: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, HeaderValue::from_str(remaining).unwrap());
        headers.insert(RESET_HEADER, HeaderValue::from_str(reset).unwrap());
        headers
    }

    #[test]
    fn parses_fractional_reset() {
        let limit = RateLimit::from_headers(&headers("0", "1700000000.5")).unwrap();
        assert!(limit.is_exhausted());
        assert!(limit.limit.is_none());
        assert!((limit.reset_epoch_secs - 1_700_000_000.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_headers_yield_none() {
        assert!(RateLimit::from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn reset_in_the_past_means_no_delay() {
        let limit = RateLimit {
            limit: Some(30),
            remaining: 0,
            reset_epoch_secs: 10.0,
        };
        assert_eq!(limit.delay_until_reset(SystemTime::now()), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn gate_blocks_until_pause_elapses() {
        let gate = RateLimitGate::new(Duration::from_secs(3600));
        gate.pause_for(Duration::from_secs(2));
        assert!(gate.is_paused());

        let started = Instant::now();
        gate.wait().await;
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(!gate.is_paused());
    }

    fn exhausted_for(secs: f64) -> RateLimit {
        let reset = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64()
            + secs;
        RateLimit {
            limit: None,
            remaining: 0,
            reset_epoch_secs: reset,
        }
    }

    #[test]
    fn reset_beyond_max_wait_is_an_error() {
        let gate = RateLimitGate::new(Duration::from_secs(5));

        let err = gate.pause_until_reset(&exhausted_for(600.0)).unwrap_err();

        match err {
            NetworkError::RateLimitWaitExceeded { wait_secs, max_secs } => {
                assert!(wait_secs > 590);
                assert_eq!(max_secs, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        // gate left open
        assert!(!gate.is_paused());
    }

    #[test]
    fn reset_within_max_wait_closes_gate_for_full_delay() {
        let gate = RateLimitGate::new(Duration::from_secs(60));

        let delay = gate.pause_until_reset(&exhausted_for(30.0)).unwrap();

        assert!(delay > Duration::from_secs(29));
        assert!(delay <= Duration::from_secs(30));
        assert!(gate.is_paused());
    }

    #[test]
    fn rounds_partial_seconds_up() {
        assert_eq!(whole_secs_rounded_up(Duration::from_millis(1500)), 2);
        assert_eq!(whole_secs_rounded_up(Duration::from_secs(3)), 3);
    }
}
