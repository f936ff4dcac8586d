// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod lifecycle;
mod validation;

use crate::{ClassSchedule, ClassType, CoachingSession};

/// Builds a persisted group session in UTC.
pub fn create_test_session(session_id: i64, date: &str, start: &str, end: &str) -> CoachingSession {
    let schedule: ClassSchedule = ClassSchedule::parse(date, start, end, "UTC").unwrap();
    let mut session: CoachingSession = CoachingSession::new(
        1,
        String::from("Tennis"),
        schedule,
        String::from("Court 3"),
        4500,
        ClassType::Group,
        8,
    );
    session.session_id = Some(session_id);
    session
}
