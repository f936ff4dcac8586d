// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Coaching session and enrollment mutations.

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use diesel::prelude::*;
use poachcoach_domain::{CoachingSession, PaymentStatus, SessionStatus};
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{coaching_sessions, session_enrollments};
use crate::error::PersistenceError;
use crate::timestamps::current_timestamp;

backend_fn! {
/// Inserts a new session and returns its ID.
///
/// The session's `session_id` and `student_ids` are ignored; enrollments
/// are created separately.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_session(
    conn: &mut _,
    session: &CoachingSession,
) -> Result<i64, PersistenceError> {
    let created_at: String = current_timestamp()?;

    diesel::insert_into(coaching_sessions::table)
        .values((
            coaching_sessions::coach_id.eq(session.coach_id),
            coaching_sessions::sport.eq(&session.sport),
            coaching_sessions::session_date.eq(session.schedule.date_string()),
            coaching_sessions::start_time.eq(session.schedule.start_string()),
            coaching_sessions::end_time.eq(session.schedule.end_string()),
            coaching_sessions::timezone.eq(session.schedule.timezone()),
            coaching_sessions::location.eq(&session.location),
            coaching_sessions::price_cents.eq(session.price_cents),
            coaching_sessions::class_type.eq(session.class_type.as_str()),
            coaching_sessions::max_students.eq(session.max_students),
            coaching_sessions::status.eq(session.status.as_str()),
            coaching_sessions::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    let session_id: i64 = conn.last_insert_id()?;

    info!(session_id, coach_id = session.coach_id, "Session created");

    Ok(session_id)
}
}

backend_fn! {
/// Sets a session's stored status.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the session does not exist.
pub fn set_session_status(
    conn: &mut _,
    session_id: i64,
    status: SessionStatus,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(coaching_sessions::table)
        .filter(coaching_sessions::session_id.eq(session_id))
        .set(coaching_sessions::status.eq(status.as_str()))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("session {session_id}")));
    }

    info!(session_id, status = %status, "Session status updated");
    Ok(())
}
}

backend_fn! {
/// Enrolls a student in a session as unpaid.
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the student is already
/// enrolled.
pub fn enroll_student(
    conn: &mut _,
    session_id: i64,
    student_id: i64,
) -> Result<i64, PersistenceError> {
    let enrolled_at: String = current_timestamp()?;

    diesel::insert_into(session_enrollments::table)
        .values((
            session_enrollments::session_id.eq(session_id),
            session_enrollments::student_id.eq(student_id),
            session_enrollments::payment_status.eq(PaymentStatus::Unpaid.as_str()),
            session_enrollments::enrolled_at.eq(&enrolled_at),
        ))
        .execute(conn)?;

    let enrollment_id: i64 = conn.last_insert_id()?;

    info!(enrollment_id, session_id, student_id, "Student enrolled");

    Ok(enrollment_id)
}
}

backend_fn! {
/// Sets the payment status of an enrollment.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the enrollment does not exist.
pub fn set_payment_status(
    conn: &mut _,
    session_id: i64,
    student_id: i64,
    payment_status: PaymentStatus,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(session_enrollments::table)
        .filter(session_enrollments::session_id.eq(session_id))
        .filter(session_enrollments::student_id.eq(student_id))
        .set(session_enrollments::payment_status.eq(payment_status.as_str()))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "enrollment of student {student_id} in session {session_id}"
        )));
    }

    info!(session_id, student_id, payment_status = %payment_status, "Payment status updated");
    Ok(())
}
}

backend_fn! {
/// Removes a student's enrollment.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the enrollment does not exist.
pub fn remove_enrollment(
    conn: &mut _,
    session_id: i64,
    student_id: i64,
) -> Result<(), PersistenceError> {
    let deleted: usize = diesel::delete(session_enrollments::table)
        .filter(session_enrollments::session_id.eq(session_id))
        .filter(session_enrollments::student_id.eq(student_id))
        .execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!(
            "enrollment of student {student_id} in session {session_id}"
        )));
    }

    info!(session_id, student_id, "Enrollment removed");
    Ok(())
}
}
