// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Time-derived class state.
//!
//! Nothing here is stored. Every answer is computed from a schedule and a
//! caller-supplied `now`, so the same inputs always give the same result.

use crate::error::DomainError;
use crate::policy::LifecyclePolicy;
use crate::types::Scheduled;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Where a class is relative to the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassPhase {
    /// `now` is before the start.
    Upcoming,
    /// `start <= now < end`.
    Active,
    /// `now >= end`.
    Ended,
}

impl ClassPhase {
    /// Converts this phase to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for ClassPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies a class as upcoming, active or ended at `now`.
///
/// # Errors
///
/// Returns an error if the schedule cannot be resolved to instants.
pub fn classify<S: Scheduled + ?Sized>(
    item: &S,
    now: OffsetDateTime,
) -> Result<ClassPhase, DomainError> {
    let schedule = item.schedule();
    let start: OffsetDateTime = schedule.start_instant()?;
    let end: OffsetDateTime = schedule.end_instant()?;

    if now < start {
        Ok(ClassPhase::Upcoming)
    } else if now < end {
        Ok(ClassPhase::Active)
    } else {
        Ok(ClassPhase::Ended)
    }
}

/// Returns the time remaining until the class starts (negative once started).
///
/// # Errors
///
/// Returns an error if the schedule cannot be resolved to instants.
pub fn time_until_start<S: Scheduled + ?Sized>(
    item: &S,
    now: OffsetDateTime,
) -> Result<Duration, DomainError> {
    Ok(item.schedule().start_instant()? - now)
}

/// Picks the upcoming class with the earliest start.
///
/// Ties keep the first element in input order.
///
/// # Errors
///
/// Returns an error if any schedule cannot be resolved to instants.
pub fn next_upcoming<S: Scheduled>(
    items: &[S],
    now: OffsetDateTime,
) -> Result<Option<&S>, DomainError> {
    let mut best: Option<(OffsetDateTime, &S)> = None;

    for item in items {
        let start: OffsetDateTime = item.schedule().start_instant()?;
        if start <= now {
            continue;
        }
        match best {
            Some((best_start, _)) if best_start <= start => {}
            _ => best = Some((start, item)),
        }
    }

    Ok(best.map(|(_, item)| item))
}

/// Returns whether the class is still visible: not ended, or ended no
/// longer ago than the policy's grace period.
///
/// # Errors
///
/// Returns an error if the schedule cannot be resolved to instants.
pub fn within_grace<S: Scheduled + ?Sized>(
    item: &S,
    now: OffsetDateTime,
    policy: &LifecyclePolicy,
) -> Result<bool, DomainError> {
    let end: OffsetDateTime = item.schedule().end_instant()?;
    Ok(now - end <= policy.ended_grace())
}

/// Returns whether attendance may be recorded for the class at `now`.
///
/// Attendance opens at the start and closes when the grace period after
/// the end runs out.
///
/// # Errors
///
/// Returns an error if the schedule cannot be resolved to instants.
pub fn attendance_open<S: Scheduled + ?Sized>(
    item: &S,
    now: OffsetDateTime,
    policy: &LifecyclePolicy,
) -> Result<bool, DomainError> {
    let phase: ClassPhase = classify(item, now)?;
    match phase {
        ClassPhase::Upcoming => Ok(false),
        ClassPhase::Active => Ok(true),
        ClassPhase::Ended => within_grace(item, now, policy),
    }
}

/// Filters out classes that ended longer ago than the grace period.
///
/// # Errors
///
/// Returns an error if any schedule cannot be resolved to instants.
pub fn visible_sessions<S: Scheduled>(
    items: Vec<S>,
    now: OffsetDateTime,
    policy: &LifecyclePolicy,
) -> Result<Vec<S>, DomainError> {
    let mut visible: Vec<S> = Vec::with_capacity(items.len());
    for item in items {
        if within_grace(&item, now, policy)? {
            visible.push(item);
        }
    }
    Ok(visible)
}
