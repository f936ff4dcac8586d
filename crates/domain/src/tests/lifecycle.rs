// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::create_test_session;
use crate::{
    ClassPhase, CoachingSession, LifecyclePolicy, attendance_open, classify, next_upcoming,
    visible_sessions, within_grace,
};
use time::macros::datetime;

#[test]
fn test_classify_boundaries() {
    let session: CoachingSession = create_test_session(1, "2026-05-10", "10:00", "11:00");

    assert_eq!(
        classify(&session, datetime!(2026-05-10 09:59:59 UTC)).unwrap(),
        ClassPhase::Upcoming
    );
    // Start is inclusive
    assert_eq!(
        classify(&session, datetime!(2026-05-10 10:00 UTC)).unwrap(),
        ClassPhase::Active
    );
    assert_eq!(
        classify(&session, datetime!(2026-05-10 10:59:59 UTC)).unwrap(),
        ClassPhase::Active
    );
    // End is exclusive
    assert_eq!(
        classify(&session, datetime!(2026-05-10 11:00 UTC)).unwrap(),
        ClassPhase::Ended
    );
}

#[test]
fn test_classify_overnight_class_is_active_after_midnight() {
    let session: CoachingSession = create_test_session(1, "2026-05-10", "23:00", "01:00");

    assert_eq!(
        classify(&session, datetime!(2026-05-11 00:30 UTC)).unwrap(),
        ClassPhase::Active
    );
    assert_eq!(
        classify(&session, datetime!(2026-05-11 01:00 UTC)).unwrap(),
        ClassPhase::Ended
    );
}

#[test]
fn test_classify_uses_declared_timezone() {
    let schedule = crate::ClassSchedule::parse("2026-07-01", "09:00", "10:00", "Europe/Berlin")
        .unwrap();
    // 09:00 CEST is 07:00 UTC
    assert_eq!(
        classify(&schedule, datetime!(2026-07-01 07:30 UTC)).unwrap(),
        ClassPhase::Active
    );
    assert_eq!(
        classify(&schedule, datetime!(2026-07-01 08:30 UTC)).unwrap(),
        ClassPhase::Ended
    );
}

#[test]
fn test_next_upcoming_picks_earliest_future_start() {
    let sessions: Vec<CoachingSession> = vec![
        create_test_session(1, "2026-05-12", "10:00", "11:00"),
        create_test_session(2, "2026-05-10", "08:00", "09:00"),
        create_test_session(3, "2026-05-11", "07:00", "08:00"),
        create_test_session(4, "2026-05-11", "09:00", "10:00"),
    ];
    let now = datetime!(2026-05-10 12:00 UTC);

    let next: Option<&CoachingSession> = next_upcoming(&sessions, now).unwrap();
    assert_eq!(next.and_then(|s| s.session_id), Some(3));
}

#[test]
fn test_next_upcoming_none_when_all_started() {
    let sessions: Vec<CoachingSession> =
        vec![create_test_session(1, "2026-05-10", "08:00", "09:00")];

    let next = next_upcoming(&sessions, datetime!(2026-05-10 08:00 UTC)).unwrap();
    assert!(next.is_none());
}

#[test]
fn test_next_upcoming_empty_input() {
    let sessions: Vec<CoachingSession> = Vec::new();
    assert!(
        next_upcoming(&sessions, datetime!(2026-05-10 08:00 UTC))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_grace_window_is_inclusive() {
    let session: CoachingSession = create_test_session(1, "2026-05-10", "10:00", "11:00");
    let policy: LifecyclePolicy = LifecyclePolicy::default();

    assert!(within_grace(&session, datetime!(2026-05-10 10:30 UTC), &policy).unwrap());
    assert!(within_grace(&session, datetime!(2026-05-10 11:15 UTC), &policy).unwrap());
    assert!(!within_grace(&session, datetime!(2026-05-10 11:15:01 UTC), &policy).unwrap());
}

#[test]
fn test_attendance_window() {
    let session: CoachingSession = create_test_session(1, "2026-05-10", "10:00", "11:00");
    let policy: LifecyclePolicy = LifecyclePolicy::default();

    assert!(!attendance_open(&session, datetime!(2026-05-10 09:59 UTC), &policy).unwrap());
    assert!(attendance_open(&session, datetime!(2026-05-10 10:00 UTC), &policy).unwrap());
    assert!(attendance_open(&session, datetime!(2026-05-10 11:10 UTC), &policy).unwrap());
    assert!(!attendance_open(&session, datetime!(2026-05-10 11:16 UTC), &policy).unwrap());
}

#[test]
fn test_visible_sessions_drops_stale_classes() {
    let sessions: Vec<CoachingSession> = vec![
        create_test_session(1, "2026-05-10", "08:00", "09:00"),
        create_test_session(2, "2026-05-10", "10:00", "11:00"),
        create_test_session(3, "2026-05-10", "13:00", "14:00"),
    ];
    let policy: LifecyclePolicy = LifecyclePolicy::default();

    let visible: Vec<CoachingSession> =
        visible_sessions(sessions, datetime!(2026-05-10 11:05 UTC), &policy).unwrap();
    let ids: Vec<Option<i64>> = visible.iter().map(|s| s.session_id).collect();
    assert_eq!(ids, vec![Some(2), Some(3)]);
}

#[test]
fn test_custom_grace_policy() {
    let session: CoachingSession = create_test_session(1, "2026-05-10", "10:00", "11:00");
    let policy: LifecyclePolicy = LifecyclePolicy::from_minutes(0, 720, 720).unwrap();

    assert!(within_grace(&session, datetime!(2026-05-10 11:00 UTC), &policy).unwrap());
    assert!(!within_grace(&session, datetime!(2026-05-10 11:00:01 UTC), &policy).unwrap());
}

#[test]
fn test_negative_policy_rejected() {
    assert!(LifecyclePolicy::from_minutes(-1, 720, 720).is_err());
    assert!(LifecyclePolicy::from_minutes(15, -720, 720).is_err());
}
