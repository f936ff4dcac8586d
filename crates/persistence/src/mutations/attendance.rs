// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attendance and feedback mutations.

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use diesel::prelude::*;
use poachcoach_domain::AttendanceStatus;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{attendance, feedback};
use crate::error::PersistenceError;
use crate::timestamps::current_timestamp;

backend_fn! {
/// Records or overwrites a student's attendance for a session.
///
/// Runs select-then-update-or-insert inside one transaction, so a single
/// record is atomic. Concurrent writers are not versioned: the last write
/// wins.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_id` - The class
/// * `student_id` - The student being marked
/// * `status` - Present, absent or late
/// * `recorded_by` - The coach recording it
///
/// # Errors
///
/// Returns an error if the transaction fails.
pub fn upsert_attendance(
    conn: &mut _,
    session_id: i64,
    student_id: i64,
    status: AttendanceStatus,
    recorded_by: i64,
) -> Result<i64, PersistenceError> {
    let recorded_at: String = current_timestamp()?;

    conn.transaction::<i64, PersistenceError, _>(|conn| {
        let existing: Option<i64> = attendance::table
            .filter(attendance::session_id.eq(session_id))
            .filter(attendance::student_id.eq(student_id))
            .select(attendance::attendance_id)
            .first(conn)
            .optional()?;

        if let Some(attendance_id) = existing {
            diesel::update(attendance::table)
                .filter(attendance::attendance_id.eq(attendance_id))
                .set((
                    attendance::status.eq(status.as_str()),
                    attendance::recorded_by.eq(recorded_by),
                    attendance::recorded_at.eq(&recorded_at),
                ))
                .execute(conn)?;
            debug!(attendance_id, session_id, student_id, status = %status, "Attendance overwritten");
            return Ok(attendance_id);
        }

        diesel::insert_into(attendance::table)
            .values((
                attendance::session_id.eq(session_id),
                attendance::student_id.eq(student_id),
                attendance::status.eq(status.as_str()),
                attendance::recorded_by.eq(recorded_by),
                attendance::recorded_at.eq(&recorded_at),
            ))
            .execute(conn)?;

        let attendance_id: i64 = conn.last_insert_id()?;
        info!(attendance_id, session_id, student_id, status = %status, "Attendance recorded");
        Ok(attendance_id)
    })
}
}

backend_fn! {
/// Stores a student's post-class feedback.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the student already left
/// feedback for this session.
pub fn insert_feedback(
    conn: &mut _,
    session_id: i64,
    student_id: i64,
    rating: i32,
    comment: Option<&str>,
) -> Result<i64, PersistenceError> {
    let submitted_at: String = current_timestamp()?;

    diesel::insert_into(feedback::table)
        .values((
            feedback::session_id.eq(session_id),
            feedback::student_id.eq(student_id),
            feedback::rating.eq(rating),
            feedback::comment.eq(comment),
            feedback::submitted_at.eq(&submitted_at),
        ))
        .execute(conn)?;

    let feedback_id: i64 = conn.last_insert_id()?;
    info!(feedback_id, session_id, student_id, rating, "Feedback submitted");

    Ok(feedback_id)
}
}
