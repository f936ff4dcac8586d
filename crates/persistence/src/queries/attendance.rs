// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attendance and feedback queries.

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use diesel::prelude::*;
use poachcoach_domain::AttendanceStatus;

use crate::data_models::{AttendanceData, FeedbackData};
use crate::diesel_schema::{attendance, feedback};
use crate::error::PersistenceError;

/// Diesel Queryable struct for attendance rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = attendance)]
struct AttendanceRow {
    attendance_id: i64,
    session_id: i64,
    student_id: i64,
    status: String,
    recorded_by: i64,
    recorded_at: String,
}

impl TryFrom<AttendanceRow> for AttendanceData {
    type Error = PersistenceError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status: AttendanceStatus = row.status.parse()?;
        Ok(Self {
            attendance_id: row.attendance_id,
            session_id: row.session_id,
            student_id: row.student_id,
            status,
            recorded_by: row.recorded_by,
            recorded_at: row.recorded_at,
        })
    }
}

/// Diesel Queryable struct for feedback rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = feedback)]
struct FeedbackRow {
    feedback_id: i64,
    session_id: i64,
    student_id: i64,
    rating: i32,
    comment: Option<String>,
    submitted_at: String,
}

impl From<FeedbackRow> for FeedbackData {
    fn from(row: FeedbackRow) -> Self {
        Self {
            feedback_id: row.feedback_id,
            session_id: row.session_id,
            student_id: row.student_id,
            rating: row.rating,
            comment: row.comment,
            submitted_at: row.submitted_at,
        }
    }
}

backend_fn! {
/// Retrieves a student's attendance record for a session.
///
/// # Errors
///
/// Returns an error if the query fails.
/// Returns `Ok(None)` if nothing was recorded yet.
pub fn get_attendance(
    conn: &mut _,
    session_id: i64,
    student_id: i64,
) -> Result<Option<AttendanceData>, PersistenceError> {
    attendance::table
        .filter(attendance::session_id.eq(session_id))
        .filter(attendance::student_id.eq(student_id))
        .select(AttendanceRow::as_select())
        .first(conn)
        .optional()?
        .map(AttendanceData::try_from)
        .transpose()
}
}

backend_fn! {
/// Lists all attendance records for a session, ordered by student.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_attendance_for_session(
    conn: &mut _,
    session_id: i64,
) -> Result<Vec<AttendanceData>, PersistenceError> {
    let rows: Vec<AttendanceRow> = attendance::table
        .filter(attendance::session_id.eq(session_id))
        .order(attendance::student_id.asc())
        .select(AttendanceRow::as_select())
        .load(conn)?;

    rows.into_iter().map(AttendanceData::try_from).collect()
}
}

backend_fn! {
/// Retrieves a student's feedback for a session.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_feedback(
    conn: &mut _,
    session_id: i64,
    student_id: i64,
) -> Result<Option<FeedbackData>, PersistenceError> {
    let row: Option<FeedbackRow> = feedback::table
        .filter(feedback::session_id.eq(session_id))
        .filter(feedback::student_id.eq(student_id))
        .select(FeedbackRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(FeedbackData::from))
}
}
