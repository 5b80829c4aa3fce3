//! Explicit retry policy for the static-fetch strategy.
//!
//! Decouples "how often, how long, and for what" from the fetch call
//! itself: `max_attempts`, a linear `backoff(attempt)`, and a
//! retryability classifier over fetch failures.

use std::fmt;
use std::time::Duration;

/// One failed HTTP fetch attempt, classified for retry decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Connection/transport error
    Network(String),
    /// The per-attempt timeout elapsed
    Timeout,
    /// Non-2xx response that was not usable as content
    Status(u16),
    /// HTTP 429
    RateLimited,
    /// Body was neither HTML-shaped nor large enough to attempt
    UnusableBody(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(reason) => write!(f, "network error: {reason}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Status(status) => write!(f, "unexpected HTTP status {status}"),
            Self::RateLimited => write!(f, "rate limited (HTTP 429)"),
            Self::UnusableBody(reason) => write!(f, "unusable response body: {reason}"),
        }
    }
}

/// Retry policy: attempt count, backoff curve, retryability.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Base delay; waits grow linearly with the attempt count
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with an explicit attempt budget.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Wait before the next attempt, growing linearly: `base * (attempt + 1)`
    /// where `attempt` is zero-based.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }

    /// Whether another attempt may change the outcome.
    ///
    /// Rotating the User-Agent and cache-buster can get past transient
    /// blocks and flaky networks; a body that is fundamentally not HTML
    /// will not improve.
    #[must_use]
    pub fn is_retryable(&self, failure: &FetchFailure) -> bool {
        match failure {
            FetchFailure::Network(_)
            | FetchFailure::Timeout
            | FetchFailure::Status(_)
            | FetchFailure::RateLimited => true,
            FetchFailure::UnusableBody(_) => false,
        }
    }
}
