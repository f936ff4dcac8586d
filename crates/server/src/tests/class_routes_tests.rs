// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::http::StatusCode;
use poachcoach_domain::UserRole;
use serde_json::{Value, json};

use super::helpers::{TestServer, days_from_now, insert_running_class, send, signed_in, test_server};
use crate::live::LiveEvent;

struct Cast {
    coach_id: i64,
    coach: String,
    student_id: i64,
    student: String,
}

async fn cast(server: &TestServer) -> Cast {
    let (coach_id, coach) =
        signed_in(server, "coach@example.com", UserRole::Coach, "Casey Coach").await;
    let (student_id, student) =
        signed_in(server, "sam@example.com", UserRole::Student, "Sam Student").await;
    Cast {
        coach_id,
        coach,
        student_id,
        student,
    }
}

fn class_request(date: &str) -> Value {
    json!({
        "sport": "Tennis",
        "date": date,
        "start_time": "09:00",
        "end_time": "10:30",
        "location": "Court 3",
        "price_cents": 4500,
        "class_type": "group",
        "max_students": 4,
    })
}

async fn create_future_class(server: &TestServer, coach: &str) -> i64 {
    let (status, body) = send(
        server,
        "POST",
        "/api/coach/classes",
        Some(coach),
        Some(class_request(&days_from_now(2))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["session_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_coach_creates_and_lists_classes() {
    let server = test_server();
    let cast = cast(&server).await;

    let session_id: i64 = create_future_class(&server, &cast.coach).await;

    let (status, body) = send(&server, "GET", "/api/coach/classes", Some(&cast.coach), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classes"][0]["session_id"], session_id);
    assert_eq!(body["classes"][0]["phase"], "upcoming");
    assert_eq!(body["classes"][0]["timezone"], "UTC");
    assert_eq!(body["classes"][0]["start_time_display"], "9:00 AM");
}

#[tokio::test]
async fn test_student_cannot_create_class() {
    let server = test_server();
    let cast = cast(&server).await;

    let (status, body) = send(
        &server,
        "POST",
        "/api/coach/classes",
        Some(&cast.student),
        Some(class_request(&days_from_now(2))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_invalid_class_fields_are_400() {
    let server = test_server();
    let cast = cast(&server).await;
    let mut request: Value = class_request(&days_from_now(2));
    request["timezone"] = json!("Mars/Olympus");

    let (status, body) = send(
        &server,
        "POST",
        "/api/coach/classes",
        Some(&cast.coach),
        Some(request),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("timezone"));
}

#[tokio::test]
async fn test_booking_flow_with_payment_and_refund() {
    let server = test_server();
    let cast = cast(&server).await;
    let session_id: i64 = create_future_class(&server, &cast.coach).await;
    let mut live = server.state.live.subscribe();

    let (status, body) = send(
        &server,
        "GET",
        "/api/classes/available",
        Some(&cast.student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classes"].as_array().unwrap().len(), 1);

    let booking = json!({ "session_id": session_id });
    let (status, body) = send(
        &server,
        "POST",
        "/api/student/book",
        Some(&cast.student),
        Some(booking.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["payment_status"], "unpaid");
    assert_eq!(
        live.try_recv().unwrap(),
        LiveEvent::BookingCreated {
            session_id,
            student_id: cast.student_id
        }
    );

    let (status, _) = send(
        &server,
        "POST",
        "/api/student/book",
        Some(&cast.student),
        Some(booking.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &server,
        "POST",
        "/api/student/pay",
        Some(&cast.student),
        Some(booking.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_status"], "paid");
    assert_eq!(body["transfer"]["status"], "pending");
    let reference: String = body["transfer"]["reference"].as_str().unwrap().to_string();

    let (status, body) = send(
        &server,
        "GET",
        &format!("/api/payments/transfers/{reference}"),
        Some(&cast.student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reference"], reference.as_str());

    let (status, body) = send(
        &server,
        "GET",
        "/api/student/next-class",
        Some(&cast.student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["next_class"]["class"]["session_id"], session_id);

    let (status, body) = send(
        &server,
        "POST",
        "/api/student/cancel-booking",
        Some(&cast.student),
        Some(booking),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refund"]["eligible"], true);
    assert_eq!(body["refunded_cents"], 4500);
    assert_eq!(body["payment_status"], "refunded");
    assert_eq!(
        live.try_recv().unwrap(),
        LiveEvent::BookingCancelled {
            session_id,
            student_id: cast.student_id
        }
    );

    let (_, body) = send(&server, "GET", "/api/notifications", Some(&cast.coach), None).await;
    assert_eq!(body["notifications"][0]["title"], "Booking cancelled");
    assert_eq!(body["notifications"][1]["title"], "New booking");
}

#[tokio::test]
async fn test_booking_unknown_class_is_404() {
    let server = test_server();
    let cast = cast(&server).await;

    let (status, body) = send(
        &server,
        "POST",
        "/api/student/book",
        Some(&cast.student),
        Some(json!({ "session_id": 4242 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_running_class_roster_and_attendance() {
    let server = test_server();
    let cast = cast(&server).await;
    let session_id: i64 = insert_running_class(&server, cast.coach_id).await;
    server
        .state
        .persistence
        .lock()
        .await
        .enroll_student(session_id, cast.student_id)
        .unwrap();
    let mut live = server.state.live.subscribe();

    let (status, body) = send(
        &server,
        "POST",
        "/api/student/active-class-students",
        Some(&cast.student),
        Some(json!({ "session_id": session_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["class"]["phase"], "active");
    assert_eq!(body["students"][0]["full_name"], "Sam Student");

    let (status, body) = send(
        &server,
        "POST",
        "/api/coach/class-management/submit-attendance",
        Some(&cast.coach),
        Some(json!({
            "session_id": session_id,
            "records": [{ "student_id": cast.student_id, "status": "present" }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        live.try_recv().unwrap(),
        LiveEvent::AttendanceRecorded {
            session_id,
            student_ids: vec![cast.student_id]
        }
    );

    let (status, body) = send(
        &server,
        "POST",
        "/api/student/attendance-status",
        Some(&cast.student),
        Some(json!({ "session_id": session_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "present");

    let (status, body) = send(
        &server,
        "POST",
        "/api/student/submit-feedback",
        Some(&cast.student),
        Some(json!({ "session_id": session_id, "rating": 5, "comment": "Great drills" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["feedback_id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_coach_cancels_class_and_students_hear_about_it() {
    let server = test_server();
    let cast = cast(&server).await;
    let session_id: i64 = create_future_class(&server, &cast.coach).await;
    send(
        &server,
        "POST",
        "/api/student/book",
        Some(&cast.student),
        Some(json!({ "session_id": session_id })),
    )
    .await;
    let mut live = server.state.live.subscribe();

    let (status, body) = send(
        &server,
        "POST",
        "/api/coach/class-management/cancel-class",
        Some(&cast.coach),
        Some(json!({ "session_id": session_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(
        live.try_recv().unwrap(),
        LiveEvent::ClassCancelled { session_id }
    );

    let (_, body) = send(&server, "GET", "/api/notifications", Some(&cast.student), None).await;
    assert_eq!(body["notifications"][0]["title"], "Class cancelled");

    let (status, _) = send(
        &server,
        "POST",
        "/api/coach/class-management/cancel-class",
        Some(&cast.student),
        Some(json!({ "session_id": session_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_second_payment_while_transfer_runs_is_refused() {
    let server = test_server();
    let cast = cast(&server).await;
    let session_id: i64 = create_future_class(&server, &cast.coach).await;
    let booking = json!({ "session_id": session_id });
    send(
        &server,
        "POST",
        "/api/student/book",
        Some(&cast.student),
        Some(booking.clone()),
    )
    .await;

    let running = server
        .state
        .pending_payments
        .claim(session_id, cast.student_id)
        .unwrap();
    let (status, body) = send(
        &server,
        "POST",
        "/api/student/pay",
        Some(&cast.student),
        Some(booking.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert!(
        server
            .state
            .pending_payments
            .contains(session_id, cast.student_id)
    );

    drop(running);
    let (status, body) = send(
        &server,
        "POST",
        "/api/student/pay",
        Some(&cast.student),
        Some(booking),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["payment_status"], "paid");
    assert!(
        !server
            .state
            .pending_payments
            .contains(session_id, cast.student_id)
    );
}
