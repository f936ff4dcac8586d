// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod expiry;
mod lifecycle;
mod policy;
mod refund;
mod schedule;
mod transitions;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use expiry::{auto_expire_unpaid, is_expired_unpaid};
pub use lifecycle::{
    ClassPhase, attendance_open, classify, next_upcoming, time_until_start, visible_sessions,
    within_grace,
};
pub use policy::{
    DEFAULT_ENDED_GRACE, DEFAULT_REFUND_CUTOFF, DEFAULT_UNPAID_EXPIRY, LifecyclePolicy,
};
pub use refund::{RefundQuote, refund_window};
pub use schedule::{
    ClassSchedule, format_12h, format_24h, format_date, parse_12h, parse_24h, parse_date,
    parse_timezone,
};
pub use transitions::{LifecycleTransition, PhaseTracker};

// Re-export public types
pub use types::{
    AttendanceStatus, Booking, ClassType, CoachingSession, PaymentStatus, Scheduled,
    SessionStatus, UserRole,
};
pub use validation::{
    MAX_COMMENT_LENGTH, MAX_GROUP_SIZE, MAX_TEXT_LENGTH, validate_capacity, validate_comment,
    validate_email, validate_full_name, validate_rating, validate_session_fields,
};
