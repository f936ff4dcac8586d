// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for PoachCoach.
//!
//! Stores users, auth sessions, coaching sessions, enrollments,
//! attendance, feedback and notifications. Built on Diesel.
//!
//! ## Database Backend Support
//!
//! - **`SQLite`** (default): development, unit and integration tests,
//!   single-node deployments. Always compiled.
//! - **`MariaDB`/`MySQL`**: compiled with the `mysql` feature and validated
//!   only by explicit opt-in tests:
//!
//! ```bash
//! cargo xtask test-mariadb
//! ```
//!
//! ### Migration Strategy
//!
//! SQL syntax differs between backends, so each has its own directory:
//!
//! - `migrations/`: `SQLite`
//! - `migrations_mysql/`: `MySQL`/`MariaDB`
//!
//! Both produce the same schema. `cargo xtask verify-migrations` checks it.
//!
//! ## Testing Philosophy
//!
//! - `cargo test` runs against a fresh in-memory `SQLite` database per test
//! - Backend validation tests are `#[ignore]`d and run only through `xtask`

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use poachcoach_domain::{AttendanceStatus, CoachingSession, PaymentStatus, SessionStatus, UserRole};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID, so tests
/// never share a database.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates monomorphic backend-specific query/mutation functions.
///
/// One body becomes two functions:
/// - `<name>_sqlite` taking `&mut SqliteConnection`
/// - `<name>_mysql` taking `&mut MysqlConnection` (only with the `mysql`
///   feature)
///
/// Diesel needs concrete backend types at compile time, and a generic
/// function over every backend is not expressible in its DSL. The macro
/// only duplicates bodies; dispatch happens in [`Persistence`].
///
/// # Usage
///
/// ```ignore
/// backend_fn! {
///     pub fn my_query(conn: &mut _, param: i64) -> Result<String, PersistenceError> {
///         diesel_schema::table::table
///             .filter(diesel_schema::table::id.eq(param))
///             .first::<String>(conn)
///             .map_err(Into::into)
///     }
/// }
/// ```
macro_rules! backend_fn {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident (
            $conn:ident : &mut _
            $(, $param:ident : $param_ty:ty)* $(,)?
        ) -> $ret:ty
        $body:block
    ) => {
        pastey::paste! {
            // Generate SQLite version
            $(#[$meta])*
            $vis fn [<$name _sqlite>] (
                $conn: &mut SqliteConnection
                $(, $param : $param_ty)*
            ) -> $ret
            $body

            // Generate MySQL version
            $(#[$meta])*
            #[cfg(feature = "mysql")]
            $vis fn [<$name _mysql>] (
                $conn: &mut MysqlConnection
                $(, $param : $param_ty)*
            ) -> $ret
            $body
        }
    };
}

/// Calls the `_sqlite` or `_mysql` flavor of a generated function on the
/// active connection.
macro_rules! dispatch {
    ($self:ident, $layer:ident :: $module:ident :: $func:ident ( $($arg:expr),* $(,)? )) => {
        pastey::paste! {
            match &mut $self.conn {
                BackendConnection::Sqlite(conn) => $layer::$module::[<$func _sqlite>](conn $(, $arg)*),
                #[cfg(feature = "mysql")]
                BackendConnection::Mysql(conn) => $layer::$module::[<$func _mysql>](conn $(, $arg)*),
            }
        }
    };
}

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod timestamps;

#[cfg(test)]
mod tests;

pub use data_models::{
    AttendanceData, AuthSessionData, EnrollmentData, FeedbackData, NotificationData, UserData,
};
pub use error::{PersistenceError, SetupStage};
pub use timestamps::{format_timestamp, parse_timestamp};

use backend::PersistenceBackend;
use backend::sqlite::SqliteTarget;

/// Backend-specific database connection.
pub enum BackendConnection {
    Sqlite(SqliteConnection),
    #[cfg(feature = "mysql")]
    Mysql(MysqlConnection),
}

/// Persistence adapter for every PoachCoach table.
///
/// Backend selection happens once at construction and is transparent to
/// callers.
pub struct Persistence {
    pub(crate) conn: BackendConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives its own shared-cache in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let conn: SqliteConnection = backend::sqlite::open(SqliteTarget::Memory(db_id))?;

        Ok(Self {
            conn: BackendConnection::Sqlite(conn),
        })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::setup(SetupStage::Connect, "database path is not valid UTF-8")
        })?;

        let conn: SqliteConnection = backend::sqlite::open(SqliteTarget::File(path_str))?;

        Ok(Self {
            conn: BackendConnection::Sqlite(conn),
        })
    }

    /// Creates a new persistence adapter with a `MySQL`/`MariaDB` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    #[cfg(feature = "mysql")]
    pub fn new_with_mysql(database_url: &str) -> Result<Self, PersistenceError> {
        let conn: MysqlConnection = backend::mysql::open(database_url)?;

        Ok(Self {
            conn: BackendConnection::Mysql(conn),
        })
    }

    /// Returns the name of the active backend.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match &self.conn {
            BackendConnection::Sqlite(_) => "sqlite",
            #[cfg(feature = "mysql")]
            BackendConnection::Mysql(_) => "mysql",
        }
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => conn.verify_foreign_key_enforcement(),
            #[cfg(feature = "mysql")]
            BackendConnection::Mysql(conn) => conn.verify_foreign_key_enforcement(),
        }
    }

    // ========================================================================
    // Users & Auth Sessions
    // ========================================================================

    /// Creates a user and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the email is taken.
    pub fn create_user(
        &mut self,
        email: &str,
        password: &str,
        role: UserRole,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, mutations::users::create_user(email, password, role, full_name, phone))
    }

    /// Retrieves a user by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserData>, PersistenceError> {
        dispatch!(self, queries::users::get_user_by_email(email))
    }

    /// Retrieves a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_id(&mut self, user_id: i64) -> Result<Option<UserData>, PersistenceError> {
        dispatch!(self, queries::users::get_user_by_id(user_id))
    }

    /// Returns whether an account with this email exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn email_exists(&mut self, email: &str) -> Result<bool, PersistenceError> {
        dispatch!(self, queries::users::email_exists(email))
    }

    /// Verifies a password against a bcrypt hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is malformed.
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
        queries::users::verify_password(password, password_hash)
    }

    /// Stamps the user's last sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_last_login(&mut self, user_id: i64) -> Result<(), PersistenceError> {
        dispatch!(self, mutations::users::update_last_login(user_id))
    }

    /// Creates a bearer-token session.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_auth_session(
        &mut self,
        session_token: &str,
        user_id: i64,
        expires_at: &str,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, mutations::users::create_auth_session(session_token, user_id, expires_at))
    }

    /// Retrieves an auth session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_auth_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<AuthSessionData>, PersistenceError> {
        dispatch!(self, queries::users::get_auth_session_by_token(session_token))
    }

    /// Touches an auth session's last activity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_auth_session_activity(
        &mut self,
        auth_session_id: i64,
    ) -> Result<(), PersistenceError> {
        dispatch!(self, mutations::users::update_auth_session_activity(auth_session_id))
    }

    /// Deletes an auth session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_auth_session(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        dispatch!(self, mutations::users::delete_auth_session(session_token))
    }

    /// Counts a user's auth sessions still valid at `now` (storage format).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_live_auth_sessions(
        &mut self,
        user_id: i64,
        now: &str,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, queries::users::count_live_auth_sessions(user_id, now))
    }

    /// Deletes auth sessions that expired before `now` (storage format).
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_expired_auth_sessions(&mut self, now: &str) -> Result<usize, PersistenceError> {
        dispatch!(self, mutations::users::delete_expired_auth_sessions(now))
    }

    // ========================================================================
    // Coaching Sessions & Enrollments
    // ========================================================================

    /// Inserts a new session and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_session(&mut self, session: &CoachingSession) -> Result<i64, PersistenceError> {
        dispatch!(self, mutations::classes::insert_session(session))
    }

    /// Retrieves a session with its roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is invalid.
    pub fn get_session(
        &mut self,
        session_id: i64,
    ) -> Result<Option<CoachingSession>, PersistenceError> {
        dispatch!(self, queries::classes::get_session(session_id))
    }

    /// Lists a coach's sessions by date and start time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_sessions_for_coach(
        &mut self,
        coach_id: i64,
    ) -> Result<Vec<CoachingSession>, PersistenceError> {
        dispatch!(self, queries::classes::list_sessions_for_coach(coach_id))
    }

    /// Lists scheduled sessions on any of the given dates.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_scheduled_sessions_on_dates(
        &mut self,
        dates: &[String],
    ) -> Result<Vec<CoachingSession>, PersistenceError> {
        dispatch!(self, queries::classes::list_scheduled_sessions_on_dates(dates))
    }

    /// Lists scheduled sessions dated on or after `from_date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_scheduled_sessions_from(
        &mut self,
        from_date: &str,
    ) -> Result<Vec<CoachingSession>, PersistenceError> {
        dispatch!(self, queries::classes::list_scheduled_sessions_from(from_date))
    }

    /// Sets a session's stored status.
    ///
    /// # Errors
    ///
    /// Returns an error if the session does not exist or the update fails.
    pub fn set_session_status(
        &mut self,
        session_id: i64,
        status: SessionStatus,
    ) -> Result<(), PersistenceError> {
        dispatch!(self, mutations::classes::set_session_status(session_id, status))
    }

    /// Enrolls a student as unpaid.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if already enrolled.
    pub fn enroll_student(
        &mut self,
        session_id: i64,
        student_id: i64,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, mutations::classes::enroll_student(session_id, student_id))
    }

    /// Retrieves a student's enrollment in a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_enrollment(
        &mut self,
        session_id: i64,
        student_id: i64,
    ) -> Result<Option<EnrollmentData>, PersistenceError> {
        dispatch!(self, queries::classes::get_enrollment(session_id, student_id))
    }

    /// Lists a student's enrollments with their sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_bookings_for_student(
        &mut self,
        student_id: i64,
    ) -> Result<Vec<(EnrollmentData, CoachingSession)>, PersistenceError> {
        dispatch!(self, queries::classes::list_bookings_for_student(student_id))
    }

    /// Counts enrollments in a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_enrollments(&mut self, session_id: i64) -> Result<i64, PersistenceError> {
        dispatch!(self, queries::classes::count_enrollments(session_id))
    }

    /// Sets an enrollment's payment status.
    ///
    /// # Errors
    ///
    /// Returns an error if the enrollment does not exist or the update fails.
    pub fn set_payment_status(
        &mut self,
        session_id: i64,
        student_id: i64,
        payment_status: PaymentStatus,
    ) -> Result<(), PersistenceError> {
        dispatch!(self, mutations::classes::set_payment_status(session_id, student_id, payment_status))
    }

    /// Removes an enrollment.
    ///
    /// # Errors
    ///
    /// Returns an error if the enrollment does not exist or the delete fails.
    pub fn remove_enrollment(
        &mut self,
        session_id: i64,
        student_id: i64,
    ) -> Result<(), PersistenceError> {
        dispatch!(self, mutations::classes::remove_enrollment(session_id, student_id))
    }

    // ========================================================================
    // Attendance & Feedback
    // ========================================================================

    /// Records or overwrites attendance for one student. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub fn upsert_attendance(
        &mut self,
        session_id: i64,
        student_id: i64,
        status: AttendanceStatus,
        recorded_by: i64,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, mutations::attendance::upsert_attendance(session_id, student_id, status, recorded_by))
    }

    /// Retrieves a student's attendance for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_attendance(
        &mut self,
        session_id: i64,
        student_id: i64,
    ) -> Result<Option<AttendanceData>, PersistenceError> {
        dispatch!(self, queries::attendance::get_attendance(session_id, student_id))
    }

    /// Lists attendance records for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_attendance_for_session(
        &mut self,
        session_id: i64,
    ) -> Result<Vec<AttendanceData>, PersistenceError> {
        dispatch!(self, queries::attendance::list_attendance_for_session(session_id))
    }

    /// Stores post-class feedback.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` on a second submission.
    pub fn insert_feedback(
        &mut self,
        session_id: i64,
        student_id: i64,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, mutations::attendance::insert_feedback(session_id, student_id, rating, comment))
    }

    /// Retrieves a student's feedback for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_feedback(
        &mut self,
        session_id: i64,
        student_id: i64,
    ) -> Result<Option<FeedbackData>, PersistenceError> {
        dispatch!(self, queries::attendance::get_feedback(session_id, student_id))
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Stores an unread notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_notification(
        &mut self,
        user_id: i64,
        title: &str,
        body: &str,
    ) -> Result<i64, PersistenceError> {
        dispatch!(self, mutations::notifications::create_notification(user_id, title, body))
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_notifications(
        &mut self,
        user_id: i64,
    ) -> Result<Vec<NotificationData>, PersistenceError> {
        dispatch!(self, queries::notifications::list_notifications(user_id))
    }

    /// Marks one of the user's notifications read.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if it is missing or not theirs.
    pub fn mark_notification_read(
        &mut self,
        notification_id: i64,
        user_id: i64,
    ) -> Result<(), PersistenceError> {
        dispatch!(self, mutations::notifications::mark_notification_read(notification_id, user_id))
    }
}
