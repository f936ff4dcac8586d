// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::lifecycle::time_until_start;
use crate::policy::LifecyclePolicy;
use crate::types::{Booking, PaymentStatus};
use time::{Duration, OffsetDateTime};

/// Returns whether an unpaid booking should be dropped at `now`.
///
/// Only bookings that start strictly within the expiry window qualify.
/// A booking exactly at the boundary, or one whose class already started,
/// is left alone.
///
/// # Errors
///
/// Returns an error if the schedule cannot be resolved to instants.
pub fn is_expired_unpaid(
    booking: &Booking,
    now: OffsetDateTime,
    policy: &LifecyclePolicy,
) -> Result<bool, DomainError> {
    if booking.payment_status != PaymentStatus::Unpaid {
        return Ok(false);
    }
    let until_start: Duration = time_until_start(booking, now)?;
    Ok(until_start > Duration::ZERO && until_start < policy.unpaid_expiry())
}

/// Removes unpaid bookings whose class starts within the expiry window.
///
/// The relative order of the remaining bookings is preserved.
///
/// # Errors
///
/// Returns an error if any schedule cannot be resolved to instants.
pub fn auto_expire_unpaid(
    bookings: Vec<Booking>,
    now: OffsetDateTime,
    policy: &LifecyclePolicy,
) -> Result<Vec<Booking>, DomainError> {
    let mut kept: Vec<Booking> = Vec::with_capacity(bookings.len());
    for booking in bookings {
        if !is_expired_unpaid(&booking, now, policy)? {
            kept.push(booking);
        }
    }
    Ok(kept)
}
