// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Storage format for timestamps.
//!
//! Timestamps are UTC, second precision, fixed width
//! (`2026-03-02T14:00:00Z`), so text comparison in SQL orders them
//! chronologically on every backend.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::PersistenceError;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// Formats an instant in storage format.
///
/// # Errors
///
/// Returns an error if the instant cannot be formatted.
pub fn format_timestamp(at: OffsetDateTime) -> Result<String, PersistenceError> {
    at.to_offset(UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .map_err(|e| PersistenceError::DataIntegrity(format!("timestamp not representable: {e}")))
}

/// Parses a timestamp written by [`format_timestamp`].
///
/// # Errors
///
/// Returns `PersistenceError::DataIntegrity` if the text is malformed.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    PrimitiveDateTime::parse(value, TIMESTAMP_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| PersistenceError::DataIntegrity(format!("Bad timestamp '{value}': {e}")))
}

/// Returns the current instant in storage format.
pub(crate) fn current_timestamp() -> Result<String, PersistenceError> {
    format_timestamp(OffsetDateTime::now_utc())
}
