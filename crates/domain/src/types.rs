// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::schedule::ClassSchedule;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The role a registered user plays in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Books and attends sessions.
    Student,
    /// Creates sessions and records attendance.
    Coach,
}

impl UserRole {
    /// Converts this role to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Coach => "coach",
        }
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "coach" => Ok(Self::Coach),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a session is one-on-one or for several students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    /// Exactly one student.
    Individual,
    /// Two or more students.
    Group,
}

impl ClassType {
    /// Converts this class type to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Group => "group",
        }
    }
}

impl FromStr for ClassType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "group" => Ok(Self::Group),
            _ => Err(DomainError::InvalidClassType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ClassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The stored status of a session.
///
/// Whether a session is upcoming, active or ended is never stored; see
/// [`crate::ClassPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Open for booking and attendance.
    #[default]
    Scheduled,
    /// Called off by the coach.
    Cancelled,
}

impl SessionStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidSessionStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-student attendance marking for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// Attended from the start.
    Present,
    /// Did not attend.
    Absent,
    /// Attended but arrived late.
    Late,
}

impl AttendanceStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            _ => Err(DomainError::InvalidAttendanceStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state of a single booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Booked but not yet paid.
    #[default]
    Unpaid,
    /// Paid in full.
    Paid,
    /// Paid and later refunded.
    Refunded,
}

impl PaymentStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            _ => Err(DomainError::InvalidPaymentStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anything that carries a class schedule.
///
/// The lifecycle functions are written against this trait so they work on
/// bare schedules, sessions and bookings alike.
pub trait Scheduled {
    /// Returns the schedule of this item.
    fn schedule(&self) -> &ClassSchedule;
}

impl Scheduled for ClassSchedule {
    fn schedule(&self) -> &ClassSchedule {
        self
    }
}

/// A scheduled coaching class instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachingSession {
    /// The canonical numeric identifier assigned by the database.
    /// `None` indicates the session has not been persisted yet.
    pub session_id: Option<i64>,
    /// The coach who runs the session.
    pub coach_id: i64,
    /// Students enrolled in the session.
    pub student_ids: Vec<i64>,
    /// The sport being coached.
    pub sport: String,
    /// When the session takes place.
    pub schedule: ClassSchedule,
    /// Where the session takes place.
    pub location: String,
    /// Price per student in cents.
    pub price_cents: i64,
    /// Individual or group.
    pub class_type: ClassType,
    /// Maximum number of enrolled students.
    pub max_students: i32,
    /// Stored status.
    pub status: SessionStatus,
}

impl CoachingSession {
    /// Creates a new, not yet persisted, scheduled session with no students.
    #[must_use]
    pub const fn new(
        coach_id: i64,
        sport: String,
        schedule: ClassSchedule,
        location: String,
        price_cents: i64,
        class_type: ClassType,
        max_students: i32,
    ) -> Self {
        Self {
            session_id: None,
            coach_id,
            student_ids: Vec::new(),
            sport,
            schedule,
            location,
            price_cents,
            class_type,
            max_students,
            status: SessionStatus::Scheduled,
        }
    }

    /// Returns how many more students can enroll.
    #[must_use]
    pub fn remaining_capacity(&self) -> i32 {
        let enrolled: i32 = i32::try_from(self.student_ids.len()).unwrap_or(i32::MAX);
        self.max_students.saturating_sub(enrolled).max(0)
    }

    /// Returns whether the given student is enrolled.
    #[must_use]
    pub fn has_student(&self, student_id: i64) -> bool {
        self.student_ids.contains(&student_id)
    }

    /// Returns whether the session can take new bookings, ignoring time.
    #[must_use]
    pub fn accepts_bookings(&self) -> bool {
        self.status == SessionStatus::Scheduled && self.remaining_capacity() > 0
    }
}

impl Scheduled for CoachingSession {
    fn schedule(&self) -> &ClassSchedule {
        &self.schedule
    }
}

/// A student's enrollment in a session together with its payment state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// The booked session.
    pub session: CoachingSession,
    /// The enrolled student.
    pub student_id: i64,
    /// Payment state of this booking.
    pub payment_status: PaymentStatus,
}

impl Booking {
    /// Creates a new booking.
    #[must_use]
    pub const fn new(session: CoachingSession, student_id: i64, payment_status: PaymentStatus) -> Self {
        Self {
            session,
            student_id,
            payment_status,
        }
    }
}

impl Scheduled for Booking {
    fn schedule(&self) -> &ClassSchedule {
        &self.session.schedule
    }
}
