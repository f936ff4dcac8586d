// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use poachcoach_domain::{ClassSchedule, ClassType, CoachingSession, LifecyclePolicy, UserRole};
use poachcoach_persistence::Persistence;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::AuthenticatedUser;

pub const PASSWORD: &str = "Sup3r!secret";

/// Noon UTC on the day most test classes take place.
pub fn test_now() -> OffsetDateTime {
    datetime!(2026-05-10 12:00 UTC)
}

pub fn test_policy() -> LifecyclePolicy {
    LifecyclePolicy::default()
}

pub struct TestContext {
    pub persistence: Persistence,
    pub coach: AuthenticatedUser,
    pub student: AuthenticatedUser,
    pub other_student: AuthenticatedUser,
}

fn create_user(
    persistence: &mut Persistence,
    email: &str,
    role: UserRole,
    full_name: &str,
) -> AuthenticatedUser {
    let user_id: i64 = persistence
        .create_user(email, PASSWORD, role, full_name, None)
        .unwrap();
    AuthenticatedUser {
        user_id,
        email: email.to_string(),
        role,
        full_name: full_name.to_string(),
    }
}

pub fn setup() -> TestContext {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let coach: AuthenticatedUser =
        create_user(&mut persistence, "coach@example.com", UserRole::Coach, "Casey Coach");
    let student: AuthenticatedUser =
        create_user(&mut persistence, "sam@example.com", UserRole::Student, "Sam Student");
    let other_student: AuthenticatedUser =
        create_user(&mut persistence, "alex@example.com", UserRole::Student, "Alex Student");

    TestContext {
        persistence,
        coach,
        student,
        other_student,
    }
}

/// Stores a UTC group class for the coach directly, bypassing the
/// creation rules so tests can place classes in the past.
pub fn insert_class(ctx: &mut TestContext, date: &str, start: &str, end: &str) -> i64 {
    insert_class_with_capacity(ctx, date, start, end, 4)
}

pub fn insert_class_with_capacity(
    ctx: &mut TestContext,
    date: &str,
    start: &str,
    end: &str,
    max_students: i32,
) -> i64 {
    let class_type: ClassType = if max_students == 1 {
        ClassType::Individual
    } else {
        ClassType::Group
    };
    let session: CoachingSession = CoachingSession::new(
        ctx.coach.user_id,
        String::from("Tennis"),
        ClassSchedule::parse(date, start, end, "UTC").unwrap(),
        String::from("Court 3"),
        4500,
        class_type,
        max_students,
    );
    ctx.persistence.insert_session(&session).unwrap()
}

pub fn enroll(ctx: &mut TestContext, session_id: i64, student_id: i64) {
    ctx.persistence.enroll_student(session_id, student_id).unwrap();
}
