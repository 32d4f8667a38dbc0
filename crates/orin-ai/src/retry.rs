use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};

const MAX_BACKOFF_DOUBLINGS: u32 = 6;

/// Retry schedule for upstream completion calls.
///
/// Delays double from `base_delay_ms` per attempt, optionally jittered into
/// the upper half of the interval, and never undercut a server-provided
/// `Retry-After` hint.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub jitter: bool,
    /// Total milliseconds the call may spend waiting between attempts.
    /// Zero disables the cap.
    pub delay_budget_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            jitter: true,
            delay_budget_ms: 0,
        }
    }
}

impl RetryPolicy {
    pub fn retryable_status(status: u16) -> bool {
        matches!(status, 408 | 409 | 425 | 429) || status >= 500
    }

    pub fn retryable_transport_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
    }

    /// Delay to sleep before retry number `attempt` (zero-based), or `None`
    /// once attempts or the delay budget are exhausted.
    pub fn delay_before_retry(
        &self,
        attempt: usize,
        spent_ms: u64,
        retry_after: Option<Duration>,
    ) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let mut delay_ms = self.backoff_ms(attempt);
        if let Some(hint) = retry_after {
            let hint_ms = u64::try_from(hint.as_millis()).unwrap_or(u64::MAX);
            delay_ms = delay_ms.max(hint_ms);
        }
        if self.delay_budget_ms > 0 && spent_ms.saturating_add(delay_ms) > self.delay_budget_ms {
            return None;
        }

        Some(Duration::from_millis(delay_ms))
    }

    fn backoff_ms(&self, attempt: usize) -> u64 {
        let doublings = u32::try_from(attempt).unwrap_or(MAX_BACKOFF_DOUBLINGS);
        let exponential = self
            .base_delay_ms
            .saturating_mul(1_u64 << doublings.min(MAX_BACKOFF_DOUBLINGS));
        if !self.jitter || exponential <= 1 {
            return exponential;
        }

        // Jitter lands in [exponential/2, exponential].
        let floor = exponential / 2;
        floor.saturating_add(jitter_below(exponential - floor + 1))
    }
}

fn jitter_below(span: u64) -> u64 {
    static STATE: AtomicU64 = AtomicU64::new(0x4d59_5df4_d0f3_3173);
    if span == 0 {
        return 0;
    }
    // One splitmix64 step over a shared counter.
    let mut mixed = STATE.fetch_add(0x9E37_79B9_7F4A_7C15, Ordering::Relaxed);
    mixed = (mixed ^ (mixed >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed = (mixed ^ (mixed >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    mixed ^= mixed >> 31;
    mixed % span
}

/// Parses a `Retry-After` response header in either the delta-seconds or the
/// HTTP-date form. Dates already in the past count as a zero hint.
pub fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let retry_at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let wait_ms = retry_at.signed_duration_since(Utc::now()).num_milliseconds();
    Some(Duration::from_millis(u64::try_from(wait_ms).unwrap_or(0)))
}

/// Correlation id attached to each upstream request attempt.
pub fn request_correlation_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("orin-{millis}-{count:04}")
}
