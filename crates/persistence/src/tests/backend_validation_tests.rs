// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend validation tests for `MariaDB`/`MySQL`.
//!
//! These tests check infrastructure and schema compatibility, not business
//! rules: migrations apply, constraints are enforced, and the generated
//! `_mysql` functions behave like their `SQLite` twins.
//!
//! They are `#[ignore]`d and run only through `cargo xtask test-mariadb`,
//! which provides:
//! - `DATABASE_URL` pointing at a fresh `MariaDB` container
//! - `POACHCOACH_TEST_BACKEND=mariadb`
//!
//! Tests fail fast if that infrastructure is missing.

use std::env;

use crate::{Persistence, PersistenceError};
use poachcoach_domain::{AttendanceStatus, UserRole};

/// Returns the `MariaDB` connection URL from the environment.
///
/// # Panics
///
/// Panics if the test environment was not provisioned by xtask.
fn get_mariadb_url() -> String {
    assert_eq!(
        env::var("POACHCOACH_TEST_BACKEND").as_deref(),
        Ok("mariadb"),
        "MariaDB tests must be run via `cargo xtask test-mariadb`"
    );
    env::var("DATABASE_URL")
        .expect("DATABASE_URL not set - MariaDB tests must be run via `cargo xtask test-mariadb`")
}

fn unique_email(prefix: &str) -> String {
    let nanos: u128 = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}_{nanos}@example.com")
}

#[test]
#[ignore = "requires MariaDB provisioned by cargo xtask test-mariadb"]
fn test_mariadb_migrations_and_foreign_keys() {
    let mut persistence: Persistence = Persistence::new_with_mysql(&get_mariadb_url()).unwrap();
    assert_eq!(persistence.backend_name(), "mysql");
    persistence.verify_foreign_key_enforcement().unwrap();
}

#[test]
#[ignore = "requires MariaDB provisioned by cargo xtask test-mariadb"]
fn test_mariadb_unique_email_enforced() {
    let mut persistence: Persistence = Persistence::new_with_mysql(&get_mariadb_url()).unwrap();
    let email: String = unique_email("dup");

    persistence
        .create_user(&email, "Sup3r!secret", UserRole::Coach, "Coach", None)
        .unwrap();
    let again: Result<i64, PersistenceError> =
        persistence.create_user(&email, "Sup3r!secret", UserRole::Coach, "Coach", None);

    assert!(matches!(again, Err(PersistenceError::UniqueViolation(_))));
}

#[test]
#[ignore = "requires MariaDB provisioned by cargo xtask test-mariadb"]
fn test_mariadb_attendance_upsert_is_last_write_wins() {
    let mut persistence: Persistence = Persistence::new_with_mysql(&get_mariadb_url()).unwrap();

    let coach_id: i64 = persistence
        .create_user(&unique_email("coach"), "Sup3r!secret", UserRole::Coach, "Coach", None)
        .unwrap();
    let student_id: i64 = persistence
        .create_user(&unique_email("student"), "Sup3r!secret", UserRole::Student, "Student", None)
        .unwrap();
    let session_id: i64 = persistence
        .insert_session(&super::create_test_session(coach_id, "2026-05-10"))
        .unwrap();
    persistence.enroll_student(session_id, student_id).unwrap();

    let first: i64 = persistence
        .upsert_attendance(session_id, student_id, AttendanceStatus::Absent, coach_id)
        .unwrap();
    let second: i64 = persistence
        .upsert_attendance(session_id, student_id, AttendanceStatus::Late, coach_id)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(
        persistence
            .get_attendance(session_id, student_id)
            .unwrap()
            .unwrap()
            .status,
        AttendanceStatus::Late
    );
}
