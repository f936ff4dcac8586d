// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod attendance_tests;
#[cfg(feature = "mysql")]
mod backend_validation_tests;
mod notification_tests;

use crate::Persistence;
use poachcoach_domain::{ClassSchedule, ClassType, CoachingSession, UserRole};

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().unwrap()
}

pub fn create_test_coach(persistence: &mut Persistence) -> i64 {
    persistence
        .create_user(
            "coach@example.com",
            "Sup3r!secret",
            UserRole::Coach,
            "Casey Coach",
            Some("+15550100"),
        )
        .unwrap()
}

pub fn create_test_student(persistence: &mut Persistence, email: &str) -> i64 {
    persistence
        .create_user(email, "Sup3r!secret", UserRole::Student, "Sam Student", None)
        .unwrap()
}

pub fn create_test_session(coach_id: i64, date: &str) -> CoachingSession {
    CoachingSession::new(
        coach_id,
        String::from("Tennis"),
        ClassSchedule::parse(date, "09:00", "10:30", "America/New_York").unwrap(),
        String::from("Court 3"),
        4500,
        ClassType::Group,
        4,
    )
}
