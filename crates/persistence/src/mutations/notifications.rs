// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::notifications;
use crate::error::PersistenceError;
use crate::timestamps::current_timestamp;

backend_fn! {
/// Stores an unread notification for a user.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_notification(
    conn: &mut _,
    user_id: i64,
    title: &str,
    body: &str,
) -> Result<i64, PersistenceError> {
    let created_at: String = current_timestamp()?;

    diesel::insert_into(notifications::table)
        .values((
            notifications::user_id.eq(user_id),
            notifications::title.eq(title),
            notifications::body.eq(body),
            notifications::is_read.eq(0),
            notifications::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    let notification_id: i64 = conn.last_insert_id()?;
    debug!(notification_id, user_id, "Notification created");

    Ok(notification_id)
}
}

backend_fn! {
/// Marks a notification read, but only for its owner.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the notification does not exist
/// or belongs to someone else.
pub fn mark_notification_read(
    conn: &mut _,
    notification_id: i64,
    user_id: i64,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(notifications::table)
        .filter(notifications::notification_id.eq(notification_id))
        .filter(notifications::user_id.eq(user_id))
        .set(notifications::is_read.eq(1))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "notification {notification_id}"
        )));
    }

    Ok(())
}
}
