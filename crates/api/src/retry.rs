// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bounded retry for calls to external services.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Errors that can say whether trying again might help.
pub trait TransientError {
    /// Returns true for timeouts and connectivity failures.
    fn is_transient(&self) -> bool;
}

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed wait between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Runs `op`, re-running it after `policy.backoff` while it fails with a
/// transient error and attempts remain.
///
/// Non-transient errors are returned immediately. A policy with zero
/// attempts still runs the operation once.
///
/// # Errors
///
/// Returns the last error produced by `op`.
pub async fn retry_transient<F, Fut, T, E>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: TransientError + std::fmt::Display,
{
    let max_attempts: u32 = policy.max_attempts.max(1);
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    "Transient failure, retrying after backoff"
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
