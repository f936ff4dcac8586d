// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#[cfg(feature = "mysql")]
use diesel::MysqlConnection;
use diesel::SqliteConnection;
use diesel::prelude::*;

use crate::data_models::NotificationData;
use crate::diesel_schema::notifications;
use crate::error::PersistenceError;

/// Diesel Queryable struct for notification rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = notifications)]
struct NotificationRow {
    notification_id: i64,
    user_id: i64,
    title: String,
    body: String,
    is_read: i32,
    created_at: String,
}

impl From<NotificationRow> for NotificationData {
    fn from(row: NotificationRow) -> Self {
        Self {
            notification_id: row.notification_id,
            user_id: row.user_id,
            title: row.title,
            body: row.body,
            is_read: row.is_read != 0,
            created_at: row.created_at,
        }
    }
}

backend_fn! {
/// Lists a user's notifications, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_notifications(
    conn: &mut _,
    user_id: i64,
) -> Result<Vec<NotificationData>, PersistenceError> {
    let rows: Vec<NotificationRow> = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .order((
            notifications::created_at.desc(),
            notifications::notification_id.desc(),
        ))
        .select(NotificationRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(NotificationData::from).collect())
}
}
