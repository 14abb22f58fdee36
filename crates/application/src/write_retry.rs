use std::future::Future;

use evidentia_core::{AppError, AppResult};
use tracing::debug;

/// Default number of attempts for one read-modify-write.
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u8 = 3;

/// Upper bound accepted for configured write attempts.
pub const MAX_WRITE_ATTEMPTS_LIMIT: u8 = 10;

/// How often a conflicting versioned write is reloaded and reapplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRetryPolicy {
    max_attempts: u8,
}

impl WriteRetryPolicy {
    /// Creates a policy allowing between 1 and 10 attempts.
    pub fn new(max_attempts: u8) -> AppResult<Self> {
        if !(1..=MAX_WRITE_ATTEMPTS_LIMIT).contains(&max_attempts) {
            return Err(AppError::validation(
                "max_attempts",
                format!("must be between 1 and {MAX_WRITE_ATTEMPTS_LIMIT}"),
            ));
        }

        Ok(Self { max_attempts })
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }
}

impl Default for WriteRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }
}

/// Runs `attempt` until it succeeds, fails with a non-conflict error, or
/// the policy is exhausted. Each attempt must reload the document it writes.
pub async fn retry_on_conflict<T, F, Fut>(
    policy: WriteRetryPolicy,
    operation: &str,
    mut attempt: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt_number: u8 = 1;
    loop {
        match attempt().await {
            Err(AppError::Conflict(message)) if attempt_number < policy.max_attempts => {
                debug!(operation, attempt_number, %message, "retrying conflicting write");
                attempt_number += 1;
            }
            result => return result,
        }
    }
}
