// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{create_test_coach, create_test_persistence, create_test_session, create_test_student};
use crate::{AttendanceData, FeedbackData, Persistence, PersistenceError};
use poachcoach_domain::AttendanceStatus;

fn setup() -> (Persistence, i64, i64, i64) {
    let mut persistence: Persistence = create_test_persistence();
    let coach_id: i64 = create_test_coach(&mut persistence);
    let student_id: i64 = create_test_student(&mut persistence, "a@example.com");
    let session_id: i64 = persistence
        .insert_session(&create_test_session(coach_id, "2026-05-10"))
        .unwrap();
    persistence.enroll_student(session_id, student_id).unwrap();
    (persistence, coach_id, student_id, session_id)
}

#[test]
fn test_upsert_attendance_inserts_then_overwrites() {
    let (mut persistence, coach_id, student_id, session_id) = setup();

    let first_id: i64 = persistence
        .upsert_attendance(session_id, student_id, AttendanceStatus::Late, coach_id)
        .unwrap();
    let second_id: i64 = persistence
        .upsert_attendance(session_id, student_id, AttendanceStatus::Present, coach_id)
        .unwrap();

    assert_eq!(first_id, second_id);

    let record: AttendanceData = persistence
        .get_attendance(session_id, student_id)
        .unwrap()
        .unwrap();
    assert_eq!(record.status, AttendanceStatus::Present);
    assert_eq!(record.recorded_by, coach_id);

    let all: Vec<AttendanceData> = persistence.list_attendance_for_session(session_id).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn test_attendance_missing_returns_none() {
    let (mut persistence, _, student_id, session_id) = setup();
    assert!(
        persistence
            .get_attendance(session_id, student_id)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_feedback_once_per_student() {
    let (mut persistence, _, student_id, session_id) = setup();

    persistence
        .insert_feedback(session_id, student_id, 5, Some("Great drills"))
        .unwrap();

    let stored: FeedbackData = persistence
        .get_feedback(session_id, student_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.rating, 5);
    assert_eq!(stored.comment.as_deref(), Some("Great drills"));

    let again: Result<i64, PersistenceError> =
        persistence.insert_feedback(session_id, student_id, 4, None);
    assert!(matches!(again, Err(PersistenceError::UniqueViolation(_))));
}
