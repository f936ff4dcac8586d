// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Coaching session and enrollment queries.
//!
//! Sessions come back as domain `CoachingSession` values with their
//! `student_ids` filled from `session_enrollments`. List queries skip
//! (and log) rows whose stored schedule no longer parses, so one bad row
//! cannot hide every other class.

use std::collections::HashMap;

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use diesel::prelude::*;
use poachcoach_domain::{ClassSchedule, CoachingSession, PaymentStatus, SessionStatus};
use tracing::{debug, warn};

use crate::data_models::EnrollmentData;
use crate::diesel_schema::{coaching_sessions, session_enrollments};
use crate::error::PersistenceError;

/// Diesel Queryable struct for coaching session rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = coaching_sessions)]
struct CoachingSessionRow {
    session_id: i64,
    coach_id: i64,
    sport: String,
    session_date: String,
    start_time: String,
    end_time: String,
    timezone: String,
    location: String,
    price_cents: i64,
    class_type: String,
    max_students: i32,
    status: String,
}

/// Diesel Queryable struct for enrollment rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = session_enrollments)]
struct EnrollmentRow {
    enrollment_id: i64,
    session_id: i64,
    student_id: i64,
    payment_status: String,
    enrolled_at: String,
}

impl TryFrom<EnrollmentRow> for EnrollmentData {
    type Error = PersistenceError;

    fn try_from(row: EnrollmentRow) -> Result<Self, Self::Error> {
        let payment_status: PaymentStatus = row.payment_status.parse()?;
        Ok(Self {
            enrollment_id: row.enrollment_id,
            session_id: row.session_id,
            student_id: row.student_id,
            payment_status,
            enrolled_at: row.enrolled_at,
        })
    }
}

/// Rebuilds a domain session from its row and enrolled student IDs.
fn into_session(
    row: CoachingSessionRow,
    student_ids: Vec<i64>,
) -> Result<CoachingSession, PersistenceError> {
    let schedule: ClassSchedule = ClassSchedule::parse(
        &row.session_date,
        &row.start_time,
        &row.end_time,
        &row.timezone,
    )?;

    Ok(CoachingSession {
        session_id: Some(row.session_id),
        coach_id: row.coach_id,
        student_ids,
        sport: row.sport,
        schedule,
        location: row.location,
        price_cents: row.price_cents,
        class_type: row.class_type.parse()?,
        max_students: row.max_students,
        status: row.status.parse()?,
    })
}

/// Groups `(session_id, student_id)` pairs and rebuilds each session.
///
/// Rows that fail to rebuild are logged and dropped.
fn assemble_sessions(
    rows: Vec<CoachingSessionRow>,
    pairs: Vec<(i64, i64)>,
) -> Vec<CoachingSession> {
    let mut students: HashMap<i64, Vec<i64>> = HashMap::new();
    for (session_id, student_id) in pairs {
        students.entry(session_id).or_default().push(student_id);
    }

    rows.into_iter()
        .filter_map(|row| {
            let session_id: i64 = row.session_id;
            let student_ids: Vec<i64> = students.remove(&session_id).unwrap_or_default();
            match into_session(row, student_ids) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(session_id, error = %e, "Skipping session with invalid stored data");
                    None
                }
            }
        })
        .collect()
}

backend_fn! {
/// Retrieves a single session with its roster.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is invalid.
/// Returns `Ok(None)` if the session does not exist.
pub fn get_session(
    conn: &mut _,
    session_id: i64,
) -> Result<Option<CoachingSession>, PersistenceError> {
    debug!(session_id, "Looking up session");

    let row: Option<CoachingSessionRow> = coaching_sessions::table
        .filter(coaching_sessions::session_id.eq(session_id))
        .select(CoachingSessionRow::as_select())
        .first(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let student_ids: Vec<i64> = session_enrollments::table
        .filter(session_enrollments::session_id.eq(session_id))
        .order(session_enrollments::enrollment_id.asc())
        .select(session_enrollments::student_id)
        .load(conn)?;

    into_session(row, student_ids).map(Some)
}
}

backend_fn! {
/// Lists every session a coach owns, cancelled ones included.
///
/// Ordered by date then start time.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_sessions_for_coach(
    conn: &mut _,
    coach_id: i64,
) -> Result<Vec<CoachingSession>, PersistenceError> {
    let rows: Vec<CoachingSessionRow> = coaching_sessions::table
        .filter(coaching_sessions::coach_id.eq(coach_id))
        .order((
            coaching_sessions::session_date.asc(),
            coaching_sessions::start_time.asc(),
        ))
        .select(CoachingSessionRow::as_select())
        .load(conn)?;

    let ids: Vec<i64> = rows.iter().map(|r| r.session_id).collect();
    let pairs: Vec<(i64, i64)> = session_enrollments::table
        .filter(session_enrollments::session_id.eq_any(&ids))
        .order(session_enrollments::enrollment_id.asc())
        .select((session_enrollments::session_id, session_enrollments::student_id))
        .load(conn)?;

    Ok(assemble_sessions(rows, pairs))
}
}

backend_fn! {
/// Lists scheduled sessions whose date is one of `dates` (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_scheduled_sessions_on_dates(
    conn: &mut _,
    dates: &[String],
) -> Result<Vec<CoachingSession>, PersistenceError> {
    let rows: Vec<CoachingSessionRow> = coaching_sessions::table
        .filter(coaching_sessions::session_date.eq_any(dates))
        .filter(coaching_sessions::status.eq(SessionStatus::Scheduled.as_str()))
        .order((
            coaching_sessions::session_date.asc(),
            coaching_sessions::start_time.asc(),
        ))
        .select(CoachingSessionRow::as_select())
        .load(conn)?;

    let ids: Vec<i64> = rows.iter().map(|r| r.session_id).collect();
    let pairs: Vec<(i64, i64)> = session_enrollments::table
        .filter(session_enrollments::session_id.eq_any(&ids))
        .order(session_enrollments::enrollment_id.asc())
        .select((session_enrollments::session_id, session_enrollments::student_id))
        .load(conn)?;

    Ok(assemble_sessions(rows, pairs))
}
}

backend_fn! {
/// Lists scheduled sessions dated on or after `from_date` (`YYYY-MM-DD`).
///
/// Dates are stored zero-padded, so text comparison orders them correctly.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_scheduled_sessions_from(
    conn: &mut _,
    from_date: &str,
) -> Result<Vec<CoachingSession>, PersistenceError> {
    let rows: Vec<CoachingSessionRow> = coaching_sessions::table
        .filter(coaching_sessions::session_date.ge(from_date))
        .filter(coaching_sessions::status.eq(SessionStatus::Scheduled.as_str()))
        .order((
            coaching_sessions::session_date.asc(),
            coaching_sessions::start_time.asc(),
        ))
        .select(CoachingSessionRow::as_select())
        .load(conn)?;

    let ids: Vec<i64> = rows.iter().map(|r| r.session_id).collect();
    let pairs: Vec<(i64, i64)> = session_enrollments::table
        .filter(session_enrollments::session_id.eq_any(&ids))
        .order(session_enrollments::enrollment_id.asc())
        .select((session_enrollments::session_id, session_enrollments::student_id))
        .load(conn)?;

    Ok(assemble_sessions(rows, pairs))
}
}

backend_fn! {
/// Lists a student's enrollments paired with their sessions.
///
/// Ordered by session date then start time.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_bookings_for_student(
    conn: &mut _,
    student_id: i64,
) -> Result<Vec<(EnrollmentData, CoachingSession)>, PersistenceError> {
    let enrollment_rows: Vec<EnrollmentRow> = session_enrollments::table
        .filter(session_enrollments::student_id.eq(student_id))
        .select(EnrollmentRow::as_select())
        .load(conn)?;

    let ids: Vec<i64> = enrollment_rows.iter().map(|r| r.session_id).collect();
    let rows: Vec<CoachingSessionRow> = coaching_sessions::table
        .filter(coaching_sessions::session_id.eq_any(&ids))
        .order((
            coaching_sessions::session_date.asc(),
            coaching_sessions::start_time.asc(),
        ))
        .select(CoachingSessionRow::as_select())
        .load(conn)?;

    let pairs: Vec<(i64, i64)> = session_enrollments::table
        .filter(session_enrollments::session_id.eq_any(&ids))
        .order(session_enrollments::enrollment_id.asc())
        .select((session_enrollments::session_id, session_enrollments::student_id))
        .load(conn)?;

    let mut enrollments: HashMap<i64, EnrollmentData> = HashMap::new();
    for row in enrollment_rows {
        let enrollment: EnrollmentData = EnrollmentData::try_from(row)?;
        enrollments.insert(enrollment.session_id, enrollment);
    }

    Ok(assemble_sessions(rows, pairs)
        .into_iter()
        .filter_map(|session| {
            let enrollment: EnrollmentData = session
                .session_id
                .and_then(|id| enrollments.remove(&id))?;
            Some((enrollment, session))
        })
        .collect())
}
}

backend_fn! {
/// Retrieves one student's enrollment in a session.
///
/// # Errors
///
/// Returns an error if the query fails.
/// Returns `Ok(None)` if the student is not enrolled.
pub fn get_enrollment(
    conn: &mut _,
    session_id: i64,
    student_id: i64,
) -> Result<Option<EnrollmentData>, PersistenceError> {
    session_enrollments::table
        .filter(session_enrollments::session_id.eq(session_id))
        .filter(session_enrollments::student_id.eq(student_id))
        .select(EnrollmentRow::as_select())
        .first(conn)
        .optional()?
        .map(EnrollmentData::try_from)
        .transpose()
}
}

backend_fn! {
/// Counts enrollments in a session.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_enrollments(conn: &mut _, session_id: i64) -> Result<i64, PersistenceError> {
    Ok(session_enrollments::table
        .filter(session_enrollments::session_id.eq(session_id))
        .count()
        .get_result(conn)?)
}
}
