// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` connection setup.

use diesel::dsl::sql;
use diesel::sql_types::{BigInt, Integer};
use diesel::{Connection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use crate::error::{PersistenceError, SetupStage};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applied to every connection, in order.
const BASE_PRAGMAS: &[&str] = &["PRAGMA foreign_keys = ON"];

/// Extra settings for databases on disk.
const FILE_PRAGMAS: &[&str] = &["PRAGMA journal_mode = WAL", "PRAGMA busy_timeout = 5000"];

/// Where a `SQLite` database lives.
#[derive(Debug, Clone, Copy)]
pub enum SqliteTarget<'a> {
    /// A private shared-cache in-memory database, named by a counter.
    Memory(u64),
    /// A database file, created if missing.
    File(&'a str),
}

impl SqliteTarget<'_> {
    fn url(&self) -> String {
        match self {
            Self::Memory(id) => format!("file:poachcoach_mem_{id}?mode=memory&cache=shared"),
            Self::File(path) => (*path).to_string(),
        }
    }

    fn pragmas(&self) -> impl Iterator<Item = &'static str> {
        let extra: &'static [&'static str] = match self {
            Self::Memory(_) => &[],
            Self::File(_) => FILE_PRAGMAS,
        };
        BASE_PRAGMAS.iter().chain(extra).copied()
    }
}

#[derive(QueryableByName)]
struct ForeignKeysPragma {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Opens the database, applies the pragmas for its target, runs pending
/// migrations and checks that foreign keys are enforced.
///
/// # Errors
///
/// Returns an error if any of those steps fails.
pub fn open(target: SqliteTarget<'_>) -> Result<SqliteConnection, PersistenceError> {
    let url: String = target.url();
    info!(url = %url, "Opening SQLite database");

    let mut conn: SqliteConnection = SqliteConnection::establish(&url)
        .map_err(|e| PersistenceError::setup(SetupStage::Connect, e))?;

    for pragma in target.pragmas() {
        debug!(pragma, "Applying SQLite setting");
        diesel::sql_query(pragma)
            .execute(&mut conn)
            .map_err(|e| PersistenceError::setup(SetupStage::Configure, format!("{pragma}: {e}")))?;
    }

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::setup(SetupStage::Migrate, e))?;

    verify_foreign_key_enforcement(&mut conn)?;
    Ok(conn)
}

/// Reads `last_insert_rowid()` for this connection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_insert_id(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("last_insert_rowid()")).get_result(conn)?)
}

/// Fails unless `PRAGMA foreign_keys` reports enforcement.
///
/// # Errors
///
/// Returns `ForeignKeyEnforcementNotEnabled` when it is off.
pub fn verify_foreign_key_enforcement(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let pragma: ForeignKeysPragma = diesel::sql_query("PRAGMA foreign_keys").get_result(conn)?;
    if pragma.foreign_keys == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }
    Ok(())
}
