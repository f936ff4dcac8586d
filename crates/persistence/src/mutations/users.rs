// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User and auth-session mutations.

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use diesel::prelude::*;
use poachcoach_domain::UserRole;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{auth_sessions, users};
use crate::error::PersistenceError;
use crate::timestamps::current_timestamp;

backend_fn! {
/// Creates a new user.
///
/// The email is normalized to lowercase for case-insensitive uniqueness and
/// the password is hashed with bcrypt before it is stored.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `email` - The email address (will be normalized)
/// * `password` - The plain-text password (will be hashed)
/// * `role` - Student or coach
/// * `full_name` - Display name
/// * `phone` - Optional phone number
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the email is taken.
pub fn create_user(
    conn: &mut _,
    email: &str,
    password: &str,
    role: UserRole,
    full_name: &str,
    phone: Option<&str>,
) -> Result<i64, PersistenceError> {
    let normalized_email: String = email.trim().to_lowercase();

    info!(email = %normalized_email, role = %role, "Creating user");

    let password_hash: String = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::PasswordHash(e.to_string()))?;
    let created_at: String = current_timestamp()?;

    diesel::insert_into(users::table)
        .values((
            users::email.eq(&normalized_email),
            users::password_hash.eq(&password_hash),
            users::role.eq(role.as_str()),
            users::full_name.eq(full_name),
            users::phone.eq(phone),
            users::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    let user_id: i64 = conn.last_insert_id()?;

    info!(user_id, "User created");

    Ok(user_id)
}
}

backend_fn! {
/// Stamps the user's last successful sign-in.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_last_login(conn: &mut _, user_id: i64) -> Result<(), PersistenceError> {
    debug!(user_id, "Updating last_login_at");

    let now: String = current_timestamp()?;
    diesel::update(users::table)
        .filter(users::user_id.eq(user_id))
        .set(users::last_login_at.eq(Some(now)))
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Creates a bearer-token session.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_token` - The opaque token handed to the client
/// * `user_id` - The owning user
/// * `expires_at` - Expiry timestamp in storage format
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_auth_session(
    conn: &mut _,
    session_token: &str,
    user_id: i64,
    expires_at: &str,
) -> Result<i64, PersistenceError> {
    let now: String = current_timestamp()?;

    diesel::insert_into(auth_sessions::table)
        .values((
            auth_sessions::session_token.eq(session_token),
            auth_sessions::user_id.eq(user_id),
            auth_sessions::created_at.eq(&now),
            auth_sessions::last_activity_at.eq(&now),
            auth_sessions::expires_at.eq(expires_at),
        ))
        .execute(conn)?;

    let auth_session_id: i64 = conn.last_insert_id()?;
    debug!(auth_session_id, user_id, "Auth session created");

    Ok(auth_session_id)
}
}

backend_fn! {
/// Touches an auth session's `last_activity_at`.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_auth_session_activity(
    conn: &mut _,
    auth_session_id: i64,
) -> Result<(), PersistenceError> {
    let now: String = current_timestamp()?;

    diesel::update(auth_sessions::table)
        .filter(auth_sessions::auth_session_id.eq(auth_session_id))
        .set(auth_sessions::last_activity_at.eq(&now))
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Deletes an auth session by token.
///
/// Deleting an unknown token is not an error.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_auth_session(conn: &mut _, session_token: &str) -> Result<(), PersistenceError> {
    diesel::delete(auth_sessions::table)
        .filter(auth_sessions::session_token.eq(session_token))
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Deletes every auth session that expired before `now`.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_auth_sessions(conn: &mut _, now: &str) -> Result<usize, PersistenceError> {
    let deleted: usize = diesel::delete(auth_sessions::table)
        .filter(auth_sessions::expires_at.lt(now))
        .execute(conn)?;

    if deleted > 0 {
        info!(deleted, "Deleted expired auth sessions");
    }

    Ok(deleted)
}
}
