// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use poachcoach_domain::{ClassPhase, PaymentStatus, SessionStatus};
use time::macros::datetime;

use super::helpers::{enroll, insert_class, setup, test_now, test_policy};
use crate::{
    ApiError, CancelBookingResponse, ClassInfo, CoachClassesResponse, CreateClassRequest,
    SessionRequest, cancel_booking, cancel_class, create_class, list_coach_classes,
};

fn tennis_request(date: &str) -> CreateClassRequest {
    CreateClassRequest {
        sport: String::from(" Tennis "),
        date: date.to_string(),
        start_time: String::from("09:00"),
        end_time: String::from("10:30"),
        timezone: None,
        location: String::from("Court 3"),
        price_cents: 4500,
        class_type: String::from("group"),
        max_students: Some(6),
    }
}

#[test]
fn test_coach_creates_class_with_default_timezone() {
    let mut ctx = setup();

    let class: ClassInfo = create_class(
        &mut ctx.persistence,
        &ctx.coach,
        &tennis_request("2026-05-11"),
        "America/New_York",
        test_now(),
    )
    .unwrap();

    assert_eq!(class.sport, "Tennis");
    assert_eq!(class.timezone, "America/New_York");
    assert_eq!(class.start_time_display, "9:00 AM");
    assert_eq!(class.phase, ClassPhase::Upcoming);
    assert_eq!(class.enrolled, 0);

    let stored = ctx.persistence.get_session(class.session_id).unwrap().unwrap();
    assert_eq!(stored.coach_id, ctx.coach.user_id);
    assert_eq!(stored.max_students, 6);
}

#[test]
fn test_students_cannot_create_classes() {
    let mut ctx = setup();

    let result: Result<ClassInfo, ApiError> = create_class(
        &mut ctx.persistence,
        &ctx.student,
        &tennis_request("2026-05-11"),
        "UTC",
        test_now(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_class_in_the_past_rejected() {
    let mut ctx = setup();

    let result: Result<ClassInfo, ApiError> = create_class(
        &mut ctx.persistence,
        &ctx.coach,
        &tennis_request("2026-05-10"),
        "UTC",
        test_now(),
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "class_in_past"
    ));
}

#[test]
fn test_capacity_rules_follow_class_type() {
    let mut ctx = setup();

    let mut individual: CreateClassRequest = tennis_request("2026-05-11");
    individual.class_type = String::from("individual");
    individual.max_students = None;
    let class: ClassInfo =
        create_class(&mut ctx.persistence, &ctx.coach, &individual, "UTC", test_now()).unwrap();
    assert_eq!(class.max_students, 1);

    let mut crowded_individual: CreateClassRequest = tennis_request("2026-05-11");
    crowded_individual.class_type = String::from("individual");
    crowded_individual.max_students = Some(3);
    assert!(matches!(
        create_class(&mut ctx.persistence, &ctx.coach, &crowded_individual, "UTC", test_now()),
        Err(ApiError::InvalidInput { ref field, .. }) if field == "max_students"
    ));

    let mut group_without_capacity: CreateClassRequest = tennis_request("2026-05-11");
    group_without_capacity.max_students = None;
    assert!(matches!(
        create_class(&mut ctx.persistence, &ctx.coach, &group_without_capacity, "UTC", test_now()),
        Err(ApiError::InvalidInput { ref field, .. }) if field == "max_students"
    ));
}

#[test]
fn test_bad_schedule_is_invalid_input() {
    let mut ctx = setup();

    let mut request: CreateClassRequest = tennis_request("2026-05-11");
    request.start_time = String::from("25:00");
    assert!(matches!(
        create_class(&mut ctx.persistence, &ctx.coach, &request, "UTC", test_now()),
        Err(ApiError::InvalidInput { .. })
    ));

    let mut request: CreateClassRequest = tennis_request("2026-05-11");
    request.timezone = Some(String::from("Mars/Olympus"));
    assert!(matches!(
        create_class(&mut ctx.persistence, &ctx.coach, &request, "UTC", test_now()),
        Err(ApiError::InvalidInput { ref field, .. }) if field == "timezone"
    ));
}

#[test]
fn test_coach_listing_applies_grace_window() {
    let mut ctx = setup();
    let long_ended: i64 = insert_class(&mut ctx, "2026-05-10", "10:00", "11:00");
    let just_ended: i64 = insert_class(&mut ctx, "2026-05-10", "11:00", "11:50");
    let active: i64 = insert_class(&mut ctx, "2026-05-10", "11:30", "12:30");
    let upcoming: i64 = insert_class(&mut ctx, "2026-05-11", "09:00", "10:00");

    let response: CoachClassesResponse =
        list_coach_classes(&mut ctx.persistence, &ctx.coach, &test_policy(), test_now()).unwrap();

    let listed: Vec<(i64, ClassPhase)> = response
        .classes
        .iter()
        .map(|c| (c.session_id, c.phase))
        .collect();
    assert_eq!(
        listed,
        vec![
            (just_ended, ClassPhase::Ended),
            (active, ClassPhase::Active),
            (upcoming, ClassPhase::Upcoming),
        ]
    );
    assert!(!listed.iter().any(|(id, _)| *id == long_ended));
}

#[test]
fn test_cancel_class_notifies_enrolled_students() {
    let mut ctx = setup();
    let session_id: i64 = insert_class(&mut ctx, "2026-05-11", "09:00", "10:00");
    let student_id: i64 = ctx.student.user_id;
    enroll(&mut ctx, session_id, student_id);

    let class: ClassInfo = cancel_class(
        &mut ctx.persistence,
        &ctx.coach,
        &SessionRequest { session_id },
        test_now(),
    )
    .unwrap();

    assert_eq!(class.status, "cancelled");
    assert_eq!(
        ctx.persistence.get_session(session_id).unwrap().unwrap().status,
        SessionStatus::Cancelled
    );
    let notes = ctx.persistence.list_notifications(student_id).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Class cancelled");

    assert!(matches!(
        cancel_class(
            &mut ctx.persistence,
            &ctx.coach,
            &SessionRequest { session_id },
            test_now(),
        ),
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "session_cancelled"
    ));
}

#[test]
fn test_cancel_class_refunds_paid_bookings_regardless_of_cutoff() {
    let mut ctx = setup();
    // Starts in two hours, well past the refund cutoff for students.
    let session_id: i64 = insert_class(&mut ctx, "2026-05-10", "14:00", "15:00");
    let paid_id: i64 = ctx.student.user_id;
    let unpaid_id: i64 = ctx.other_student.user_id;
    enroll(&mut ctx, session_id, paid_id);
    enroll(&mut ctx, session_id, unpaid_id);
    ctx.persistence
        .set_payment_status(session_id, paid_id, PaymentStatus::Paid)
        .unwrap();

    cancel_class(
        &mut ctx.persistence,
        &ctx.coach,
        &SessionRequest { session_id },
        test_now(),
    )
    .unwrap();

    for (student_id, expected) in [
        (paid_id, PaymentStatus::Refunded),
        (unpaid_id, PaymentStatus::Unpaid),
    ] {
        let enrollment = ctx
            .persistence
            .get_enrollment(session_id, student_id)
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.payment_status, expected);
    }

    let paid_notes = ctx.persistence.list_notifications(paid_id).unwrap();
    assert!(paid_notes[0].body.contains("4500 cents refunded"));
    let unpaid_notes = ctx.persistence.list_notifications(unpaid_id).unwrap();
    assert!(!unpaid_notes[0].body.contains("refunded"));

    // Leaving the cancelled class afterwards does not refund a second time.
    let student = ctx.student.clone();
    let response: CancelBookingResponse = cancel_booking(
        &mut ctx.persistence,
        &student,
        &SessionRequest { session_id },
        &test_policy(),
        test_now(),
    )
    .unwrap();
    assert_eq!(response.refunded_cents, 0);
    assert_eq!(response.payment_status, PaymentStatus::Refunded);
    assert_eq!(response.message, "Booking cancelled, already refunded");
}

#[test]
fn test_only_owner_cancels_and_only_before_start() {
    let mut ctx = setup();
    let session_id: i64 = insert_class(&mut ctx, "2026-05-10", "11:30", "12:30");

    assert!(matches!(
        cancel_class(
            &mut ctx.persistence,
            &ctx.student,
            &SessionRequest { session_id },
            test_now(),
        ),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        cancel_class(
            &mut ctx.persistence,
            &ctx.coach,
            &SessionRequest { session_id },
            datetime!(2026-05-10 11:45 UTC),
        ),
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "class_already_started"
    ));
}
