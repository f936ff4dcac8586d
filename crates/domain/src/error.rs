// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A date, time or timezone could not be turned into an instant.
    InvalidScheduleData {
        /// The schedule field that failed (`date`, `start_time`, ...).
        field: &'static str,
        /// The offending input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The timezone is not a known IANA timezone name.
    InvalidTimezone(String),
    /// User role is not `student` or `coach`.
    InvalidRole(String),
    /// Class type is not `individual` or `group`.
    InvalidClassType(String),
    /// Session status is not recognized.
    InvalidSessionStatus(String),
    /// Attendance status is not `present`, `absent` or `late`.
    InvalidAttendanceStatus(String),
    /// Payment status is not recognized.
    InvalidPaymentStatus(String),
    /// Email address is malformed.
    InvalidEmail(String),
    /// Name is empty or too long.
    InvalidName(String),
    /// Sport is empty or too long.
    InvalidSport(String),
    /// Location is empty or too long.
    InvalidLocation(String),
    /// Price is negative.
    InvalidPrice(i64),
    /// Capacity does not fit the class type.
    InvalidCapacity {
        /// The class type.
        class_type: String,
        /// The requested capacity.
        max_students: i32,
    },
    /// Rating is outside 1..=5.
    InvalidRating(i32),
    /// Comment exceeds the allowed length.
    CommentTooLong {
        /// The maximum allowed length in characters.
        max: usize,
    },
    /// A required field was missing or blank.
    MissingField(&'static str),
    /// A lifecycle policy duration was negative.
    InvalidPolicy(String),
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidScheduleData {
                field,
                value,
                reason,
            } => {
                write!(f, "Invalid schedule data in {field} '{value}': {reason}")
            }
            Self::InvalidTimezone(tz) => write!(f, "Invalid timezone: {tz}"),
            Self::InvalidRole(role) => {
                write!(f, "Invalid role: '{role}'. Must be student or coach")
            }
            Self::InvalidClassType(value) => {
                write!(f, "Invalid class type: '{value}'. Must be individual or group")
            }
            Self::InvalidSessionStatus(value) => write!(f, "Invalid session status: '{value}'"),
            Self::InvalidAttendanceStatus(value) => {
                write!(
                    f,
                    "Invalid attendance status: '{value}'. Must be present, absent or late"
                )
            }
            Self::InvalidPaymentStatus(value) => write!(f, "Invalid payment status: '{value}'"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidSport(msg) => write!(f, "Invalid sport: {msg}"),
            Self::InvalidLocation(msg) => write!(f, "Invalid location: {msg}"),
            Self::InvalidPrice(price) => {
                write!(f, "Invalid price: {price}. Must not be negative")
            }
            Self::InvalidCapacity {
                class_type,
                max_students,
            } => {
                write!(
                    f,
                    "Invalid capacity {max_students} for a {class_type} class"
                )
            }
            Self::InvalidRating(rating) => {
                write!(f, "Invalid rating: {rating}. Must be between 1 and 5")
            }
            Self::CommentTooLong { max } => {
                write!(f, "Comment must be at most {max} characters")
            }
            Self::MissingField(field) => write!(f, "Missing required field: {field}"),
            Self::InvalidPolicy(msg) => write!(f, "Invalid lifecycle policy: {msg}"),
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
