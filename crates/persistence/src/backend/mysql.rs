// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `MySQL`/`MariaDB` connection setup.
//!
//! Compiled only with the `mysql` feature. `migrations_mysql/` mirrors
//! `migrations/` table for table; `cargo xtask verify-migrations` fails
//! when they drift, and `cargo xtask test-mariadb` runs the ignored
//! backend tests against a container.

use diesel::dsl::sql;
use diesel::sql_types::BigInt;
use diesel::{Connection, MysqlConnection, QueryableByName, RunQueryDsl};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::error::{PersistenceError, SetupStage};

pub const MYSQL_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations_mysql");

#[derive(QueryableByName)]
struct ForeignKeyChecks {
    #[diesel(sql_type = BigInt)]
    enabled: i64,
}

/// Connects, adds strict mode to the session and runs pending migrations.
/// Under strict mode oversized values fail instead of being truncated.
///
/// # Errors
///
/// Returns an error if any step fails.
pub fn open(database_url: &str) -> Result<MysqlConnection, PersistenceError> {
    info!("Opening MySQL database");

    let mut conn: MysqlConnection = MysqlConnection::establish(database_url)
        .map_err(|e| PersistenceError::setup(SetupStage::Connect, e))?;

    diesel::sql_query("SET SESSION sql_mode = CONCAT_WS(',', @@sql_mode, 'STRICT_ALL_TABLES')")
        .execute(&mut conn)
        .map_err(|e| PersistenceError::setup(SetupStage::Configure, e))?;

    conn.run_pending_migrations(MYSQL_MIGRATIONS)
        .map_err(|e| PersistenceError::setup(SetupStage::Migrate, e))?;

    verify_foreign_key_enforcement(&mut conn)?;
    Ok(conn)
}

/// Reads `LAST_INSERT_ID()` for this connection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_insert_id(conn: &mut MysqlConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("CAST(LAST_INSERT_ID() AS SIGNED)")).get_result(conn)?)
}

/// Fails unless `@@foreign_key_checks` is on.
///
/// # Errors
///
/// Returns `ForeignKeyEnforcementNotEnabled` when it is off.
pub fn verify_foreign_key_enforcement(conn: &mut MysqlConnection) -> Result<(), PersistenceError> {
    let checks: ForeignKeyChecks =
        diesel::sql_query("SELECT CAST(@@foreign_key_checks AS SIGNED) AS enabled")
            .get_result(conn)?;
    if checks.enabled != 1 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }
    Ok(())
}
