// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::lifecycle::time_until_start;
use crate::policy::LifecyclePolicy;
use crate::types::CoachingSession;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

/// Outcome of a refund eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RefundQuote {
    /// Whether a cancellation now would be refunded.
    pub eligible: bool,
    /// Refund amount in cents; zero when not eligible.
    pub amount_cents: i64,
    /// Hours until the class starts, negative once it has started.
    pub hours_until_start: f64,
}

/// Decides whether cancelling at `now` earns a refund.
///
/// A cancellation exactly at the cutoff is still refunded.
///
/// # Errors
///
/// Returns an error if the schedule cannot be resolved to instants.
pub fn refund_window(
    session: &CoachingSession,
    now: OffsetDateTime,
    policy: &LifecyclePolicy,
) -> Result<RefundQuote, DomainError> {
    let until_start: Duration = time_until_start(session, now)?;
    let eligible: bool = until_start >= policy.refund_cutoff();

    Ok(RefundQuote {
        eligible,
        amount_cents: if eligible { session.price_cents } else { 0 },
        hours_until_start: until_start.as_seconds_f64() / 3600.0,
    })
}
