// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User and auth-session queries.

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use diesel::prelude::*;
use poachcoach_domain::UserRole;
use tracing::debug;

use crate::data_models::{AuthSessionData, UserData};
use crate::diesel_schema::{auth_sessions, users};
use crate::error::PersistenceError;

/// Diesel Queryable struct for user rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
struct UserRow {
    user_id: i64,
    email: String,
    password_hash: String,
    role: String,
    full_name: String,
    phone: Option<String>,
    created_at: String,
    last_login_at: Option<String>,
}

impl TryFrom<UserRow> for UserData {
    type Error = PersistenceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = row.role.parse()?;
        Ok(Self {
            user_id: row.user_id,
            email: row.email,
            password_hash: row.password_hash,
            role,
            full_name: row.full_name,
            phone: row.phone,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        })
    }
}

/// Diesel Queryable struct for auth session rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = auth_sessions)]
struct AuthSessionRow {
    auth_session_id: i64,
    session_token: String,
    user_id: i64,
    created_at: String,
    last_activity_at: String,
    expires_at: String,
}

impl From<AuthSessionRow> for AuthSessionData {
    fn from(row: AuthSessionRow) -> Self {
        Self {
            auth_session_id: row.auth_session_id,
            session_token: row.session_token,
            user_id: row.user_id,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
            expires_at: row.expires_at,
        }
    }
}

backend_fn! {
/// Retrieves a user by email.
///
/// The email is trimmed and lowercased before lookup, matching how it is
/// stored.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if no user has this email.
pub fn get_user_by_email(
    conn: &mut _,
    email: &str,
) -> Result<Option<UserData>, PersistenceError> {
    let normalized_email: String = email.trim().to_lowercase();

    debug!(email = %normalized_email, "Looking up user by email");

    users::table
        .filter(users::email.eq(&normalized_email))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?
        .map(UserData::try_from)
        .transpose()
}
}

backend_fn! {
/// Retrieves a user by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user is not found.
pub fn get_user_by_id(conn: &mut _, user_id: i64) -> Result<Option<UserData>, PersistenceError> {
    debug!(user_id, "Looking up user by ID");

    users::table
        .filter(users::user_id.eq(user_id))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?
        .map(UserData::try_from)
        .transpose()
}
}

backend_fn! {
/// Returns whether an account with this email exists.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn email_exists(conn: &mut _, email: &str) -> Result<bool, PersistenceError> {
    let normalized_email: String = email.trim().to_lowercase();

    let count: i64 = users::table
        .filter(users::email.eq(&normalized_email))
        .count()
        .get_result(conn)?;

    Ok(count > 0)
}
}

backend_fn! {
/// Retrieves an auth session by its bearer token.
///
/// Expiry is not checked here; callers compare `expires_at` themselves.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the token is unknown.
pub fn get_auth_session_by_token(
    conn: &mut _,
    session_token: &str,
) -> Result<Option<AuthSessionData>, PersistenceError> {
    let row: Option<AuthSessionRow> = auth_sessions::table
        .filter(auth_sessions::session_token.eq(session_token))
        .select(AuthSessionRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(AuthSessionData::from))
}
}

backend_fn! {
/// Counts a user's auth sessions that have not expired at `now`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_live_auth_sessions(
    conn: &mut _,
    user_id: i64,
    now: &str,
) -> Result<i64, PersistenceError> {
    Ok(auth_sessions::table
        .filter(auth_sessions::user_id.eq(user_id))
        .filter(auth_sessions::expires_at.ge(now))
        .count()
        .get_result(conn)?)
}
}

/// Verifies a plain-text password against a stored bcrypt hash.
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| PersistenceError::PasswordHash(e.to_string()))
}
