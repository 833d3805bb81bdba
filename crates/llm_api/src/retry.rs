//! Bounded retry policy for the completions endpoint.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Retry budget after the initial attempt.
pub const MAX_RETRIES: u32 = 3;
/// First backoff step; each later step doubles it.
pub const BASE_DELAY_MS: u64 = 500;

/// Transient phrases the completions endpoint and the proxies in front of it
/// put in error bodies, sometimes behind a 4xx that would otherwise read as
/// permanent.
fn transient_body_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(
            r"(?i)rate.?limit|overloaded|server had an error|service.?unavailable|connection.?(refused|reset)|timed.?out",
        )
        .expect("transient-body regex must compile")
    })
}

/// Whether a failed attempt may be retried.
///
/// Rejected credentials are final regardless of body text; otherwise retry
/// on the endpoint's transient statuses (408/409/429 and the 5xx gateway
/// family) or on transient error-body phrases.
pub fn should_retry(status: u16, body: &str) -> bool {
    if matches!(status, 401 | 403) {
        return false;
    }

    matches!(status, 408 | 409 | 429 | 500 | 502 | 503 | 504)
        || transient_body_regex().is_match(body)
}

/// Backoff before retry `attempt`, doubling each step.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS << attempt.min(10))
}
