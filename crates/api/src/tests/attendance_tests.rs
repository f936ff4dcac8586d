// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use poachcoach_domain::{AttendanceStatus, SessionStatus};

use super::helpers::{TestContext, enroll, insert_class, setup, test_now, test_policy};
use crate::{
    ActiveClassStudentsResponse, ApiError, AttendanceEntry, AttendanceStatusResponse,
    SessionRequest, SubmitAttendanceRequest, SubmitAttendanceResponse, SubmitFeedbackRequest,
    active_class_students, attendance_status, submit_attendance, submit_feedback,
};

fn entry(student_id: i64, status: &str) -> AttendanceEntry {
    AttendanceEntry {
        student_id,
        status: status.to_string(),
    }
}

fn submit(
    ctx: &mut TestContext,
    session_id: i64,
    records: Vec<AttendanceEntry>,
) -> Result<SubmitAttendanceResponse, ApiError> {
    let coach = ctx.coach.clone();
    submit_attendance(
        &mut ctx.persistence,
        &coach,
        &SubmitAttendanceRequest {
            session_id,
            records,
        },
        &test_policy(),
        test_now(),
    )
}

fn rule_of<T: std::fmt::Debug>(result: Result<T, ApiError>) -> String {
    match result {
        Err(ApiError::DomainRuleViolation { rule, .. }) => rule,
        other => panic!("expected rule violation, got {other:?}"),
    }
}

/// An active class with both students enrolled.
fn active_class(ctx: &mut TestContext) -> i64 {
    let session_id: i64 = insert_class(ctx, "2026-05-10", "11:30", "12:30");
    let (student, other) = (ctx.student.user_id, ctx.other_student.user_id);
    enroll(ctx, session_id, student);
    enroll(ctx, session_id, other);
    session_id
}

#[test]
fn test_attendance_recorded_during_class() {
    let mut ctx = setup();
    let session_id: i64 = active_class(&mut ctx);
    let (student, other) = (ctx.student.user_id, ctx.other_student.user_id);

    let response: SubmitAttendanceResponse = submit(
        &mut ctx,
        session_id,
        vec![entry(student, "present"), entry(other, "late")],
    )
    .unwrap();

    assert_eq!(response.student_ids, vec![student, other]);
    assert_eq!(
        ctx.persistence
            .get_attendance(session_id, other)
            .unwrap()
            .unwrap()
            .status,
        AttendanceStatus::Late
    );

    let notes = ctx.persistence.list_notifications(student).unwrap();
    assert_eq!(notes[0].title, "Attendance recorded");
    assert!(notes[0].body.contains("present"));
}

#[test]
fn test_attendance_window_includes_grace_end() {
    let mut ctx = setup();
    let student: i64 = ctx.student.user_id;
    let in_grace: i64 = insert_class(&mut ctx, "2026-05-10", "11:00", "11:45");
    let past_grace: i64 = insert_class(&mut ctx, "2026-05-10", "10:00", "11:44");
    let upcoming: i64 = insert_class(&mut ctx, "2026-05-10", "13:00", "14:00");
    for id in [in_grace, past_grace, upcoming] {
        enroll(&mut ctx, id, student);
    }

    submit(&mut ctx, in_grace, vec![entry(student, "absent")]).unwrap();
    assert_eq!(
        rule_of(submit(&mut ctx, past_grace, vec![entry(student, "absent")])),
        "attendance_window"
    );
    assert_eq!(
        rule_of(submit(&mut ctx, upcoming, vec![entry(student, "absent")])),
        "attendance_window"
    );
}

#[test]
fn test_attendance_last_submission_wins() {
    let mut ctx = setup();
    let session_id: i64 = active_class(&mut ctx);
    let student: i64 = ctx.student.user_id;

    submit(&mut ctx, session_id, vec![entry(student, "absent")]).unwrap();
    let first_id: i64 = ctx
        .persistence
        .get_attendance(session_id, student)
        .unwrap()
        .unwrap()
        .attendance_id;
    submit(&mut ctx, session_id, vec![entry(student, "present")]).unwrap();

    let record = ctx
        .persistence
        .get_attendance(session_id, student)
        .unwrap()
        .unwrap();
    assert_eq!(record.attendance_id, first_id);
    assert_eq!(record.status, AttendanceStatus::Present);
    assert_eq!(
        ctx.persistence
            .list_attendance_for_session(session_id)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_invalid_batch_writes_nothing() {
    let mut ctx = setup();
    let session_id: i64 = insert_class(&mut ctx, "2026-05-10", "11:30", "12:30");
    let (student, other) = (ctx.student.user_id, ctx.other_student.user_id);
    enroll(&mut ctx, session_id, student);

    assert_eq!(
        rule_of(submit(
            &mut ctx,
            session_id,
            vec![entry(student, "present"), entry(other, "present")],
        )),
        "student_not_enrolled"
    );
    assert!(matches!(
        submit(
            &mut ctx,
            session_id,
            vec![entry(student, "present"), entry(student, "late")],
        ),
        Err(ApiError::InvalidInput { ref field, .. }) if field == "records"
    ));
    assert!(matches!(
        submit(&mut ctx, session_id, vec![entry(student, "sleeping")]),
        Err(ApiError::InvalidInput { .. })
    ));
    assert!(matches!(
        submit(&mut ctx, session_id, Vec::new()),
        Err(ApiError::InvalidInput { ref field, .. }) if field == "records"
    ));

    assert!(
        ctx.persistence
            .list_attendance_for_session(session_id)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_only_owning_coach_records_attendance() {
    let mut ctx = setup();
    let session_id: i64 = active_class(&mut ctx);
    let other_coach_id: i64 = ctx
        .persistence
        .create_user(
            "rival@example.com",
            "Sup3r!secret",
            poachcoach_domain::UserRole::Coach,
            "Riley Rival",
            None,
        )
        .unwrap();
    let mut rival = ctx.coach.clone();
    rival.user_id = other_coach_id;

    let result = submit_attendance(
        &mut ctx.persistence,
        &rival,
        &SubmitAttendanceRequest {
            session_id,
            records: vec![entry(ctx.student.user_id, "present")],
        },
        &test_policy(),
        test_now(),
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));

    let student = ctx.student.clone();
    let result = submit_attendance(
        &mut ctx.persistence,
        &student,
        &SubmitAttendanceRequest {
            session_id,
            records: vec![entry(student.user_id, "present")],
        },
        &test_policy(),
        test_now(),
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_cancelled_class_rejects_attendance() {
    let mut ctx = setup();
    let session_id: i64 = active_class(&mut ctx);
    ctx.persistence
        .set_session_status(session_id, SessionStatus::Cancelled)
        .unwrap();
    let student: i64 = ctx.student.user_id;

    assert_eq!(
        rule_of(submit(&mut ctx, session_id, vec![entry(student, "present")])),
        "session_cancelled"
    );
}

#[test]
fn test_student_sees_own_attendance() {
    let mut ctx = setup();
    let session_id: i64 = active_class(&mut ctx);
    let student = ctx.student.clone();
    let request = SessionRequest { session_id };

    let before: AttendanceStatusResponse =
        attendance_status(&mut ctx.persistence, &student, &request).unwrap();
    assert_eq!(before.status, None);

    submit(&mut ctx, session_id, vec![entry(student.user_id, "late")]).unwrap();
    let after: AttendanceStatusResponse =
        attendance_status(&mut ctx.persistence, &student, &request).unwrap();
    assert_eq!(after.status, Some(AttendanceStatus::Late));

    let unbooked: i64 = insert_class(&mut ctx, "2026-05-10", "11:30", "12:30");
    assert!(matches!(
        attendance_status(
            &mut ctx.persistence,
            &student,
            &SessionRequest {
                session_id: unbooked
            }
        ),
        Err(ApiError::ResourceNotFound { .. })
    ));
}

#[test]
fn test_roster_visible_to_coach_and_enrolled_students() {
    let mut ctx = setup();
    let session_id: i64 = active_class(&mut ctx);
    let student_id: i64 = ctx.student.user_id;
    submit(&mut ctx, session_id, vec![entry(student_id, "present")]).unwrap();
    let request = SessionRequest { session_id };

    let coach = ctx.coach.clone();
    let roster: ActiveClassStudentsResponse = active_class_students(
        &mut ctx.persistence,
        &coach,
        &request,
        &test_policy(),
        test_now(),
    )
    .unwrap();
    assert_eq!(roster.students.len(), 2);
    assert_eq!(roster.students[0].full_name, "Sam Student");
    assert_eq!(roster.students[0].attendance, Some(AttendanceStatus::Present));
    assert_eq!(roster.students[1].attendance, None);

    let student = ctx.student.clone();
    assert!(
        active_class_students(
            &mut ctx.persistence,
            &student,
            &request,
            &test_policy(),
            test_now()
        )
        .is_ok()
    );

    let outsider: i64 = insert_class(&mut ctx, "2026-05-10", "11:30", "12:30");
    assert!(matches!(
        active_class_students(
            &mut ctx.persistence,
            &student,
            &SessionRequest {
                session_id: outsider
            },
            &test_policy(),
            test_now()
        ),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_roster_closed_before_start() {
    let mut ctx = setup();
    let session_id: i64 = insert_class(&mut ctx, "2026-05-10", "15:00", "16:00");
    let coach = ctx.coach.clone();

    assert_eq!(
        rule_of(active_class_students(
            &mut ctx.persistence,
            &coach,
            &SessionRequest { session_id },
            &test_policy(),
            test_now(),
        )),
        "class_not_active"
    );
}

fn feedback(rating: i32, comment: Option<&str>, session_id: i64) -> SubmitFeedbackRequest {
    SubmitFeedbackRequest {
        session_id,
        rating,
        comment: comment.map(str::to_string),
    }
}

#[test]
fn test_feedback_once_per_started_class() {
    let mut ctx = setup();
    let finished: i64 = insert_class(&mut ctx, "2026-05-10", "08:00", "09:00");
    let upcoming: i64 = insert_class(&mut ctx, "2026-05-11", "08:00", "09:00");
    let student = ctx.student.clone();
    enroll(&mut ctx, finished, student.user_id);
    enroll(&mut ctx, upcoming, student.user_id);

    submit_feedback(
        &mut ctx.persistence,
        &student,
        &feedback(5, Some("Great drills"), finished),
        test_now(),
    )
    .unwrap();
    let stored = ctx
        .persistence
        .get_feedback(finished, student.user_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.rating, 5);
    assert_eq!(stored.comment.as_deref(), Some("Great drills"));

    assert_eq!(
        rule_of(submit_feedback(
            &mut ctx.persistence,
            &student,
            &feedback(4, None, finished),
            test_now(),
        )),
        "feedback_already_submitted"
    );
    assert_eq!(
        rule_of(submit_feedback(
            &mut ctx.persistence,
            &student,
            &feedback(4, None, upcoming),
            test_now(),
        )),
        "class_not_started"
    );
}

#[test]
fn test_feedback_validation() {
    let mut ctx = setup();
    let finished: i64 = insert_class(&mut ctx, "2026-05-10", "08:00", "09:00");
    let student = ctx.student.clone();

    assert!(matches!(
        submit_feedback(
            &mut ctx.persistence,
            &student,
            &feedback(6, None, finished),
            test_now(),
        ),
        Err(ApiError::InvalidInput { ref field, .. }) if field == "rating"
    ));
    assert!(matches!(
        submit_feedback(
            &mut ctx.persistence,
            &student,
            &feedback(3, None, finished),
            test_now(),
        ),
        Err(ApiError::ResourceNotFound { ref resource_type, .. }) if resource_type == "Booking"
    ));
}
