// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use time::Duration;

/// Default time an ended class stays visible and editable.
pub const DEFAULT_ENDED_GRACE: Duration = Duration::minutes(15);

/// Default minimum notice for a refundable cancellation.
pub const DEFAULT_REFUND_CUTOFF: Duration = Duration::hours(12);

/// Default window before start inside which unpaid bookings are dropped.
pub const DEFAULT_UNPAID_EXPIRY: Duration = Duration::hours(12);

/// Time thresholds used by the lifecycle rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    ended_grace: Duration,
    refund_cutoff: Duration,
    unpaid_expiry: Duration,
}

impl LifecyclePolicy {
    /// Creates a policy from explicit thresholds.
    ///
    /// # Arguments
    ///
    /// * `ended_grace` - How long after its end a class stays visible
    /// * `refund_cutoff` - Minimum notice before start for a refund
    /// * `unpaid_expiry` - Unpaid bookings starting sooner than this are removed
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPolicy` if any duration is negative.
    pub fn new(
        ended_grace: Duration,
        refund_cutoff: Duration,
        unpaid_expiry: Duration,
    ) -> Result<Self, DomainError> {
        for (name, value) in [
            ("ended_grace", ended_grace),
            ("refund_cutoff", refund_cutoff),
            ("unpaid_expiry", unpaid_expiry),
        ] {
            if value.is_negative() {
                return Err(DomainError::InvalidPolicy(format!(
                    "{name} must not be negative (got {value})"
                )));
            }
        }

        Ok(Self {
            ended_grace,
            refund_cutoff,
            unpaid_expiry,
        })
    }

    /// Creates a policy from whole minutes, as read from configuration.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPolicy` if any value is negative.
    pub fn from_minutes(
        ended_grace: i64,
        refund_cutoff: i64,
        unpaid_expiry: i64,
    ) -> Result<Self, DomainError> {
        Self::new(
            Duration::minutes(ended_grace),
            Duration::minutes(refund_cutoff),
            Duration::minutes(unpaid_expiry),
        )
    }

    #[must_use]
    pub const fn ended_grace(&self) -> Duration {
        self.ended_grace
    }

    #[must_use]
    pub const fn refund_cutoff(&self) -> Duration {
        self.refund_cutoff
    }

    #[must_use]
    pub const fn unpaid_expiry(&self) -> Duration {
        self.unpaid_expiry
    }
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            ended_grace: DEFAULT_ENDED_GRACE,
            refund_cutoff: DEFAULT_REFUND_CUTOFF,
            unpaid_expiry: DEFAULT_UNPAID_EXPIRY,
        }
    }
}
