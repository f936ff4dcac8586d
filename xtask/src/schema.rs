// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Schema introspection and comparison across backends.
//!
//! Types are compared by affinity rather than by name: `SQLite`'s
//! `INTEGER` and `MySQL`'s `BIGINT` both store an `i64`, and that is all
//! the persistence layer relies on.

use std::collections::BTreeMap;

use color_eyre::{eyre::Context, Result};
use diesel::{sql_types::Text, MysqlConnection, QueryableByName, RunQueryDsl, SqliteConnection};

/// One column as the comparison sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub affinity: &'static str,
    pub nullable: bool,
}

/// One index, identified by its columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Index {
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

/// Tables by name, excluding migration bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub tables: BTreeMap<String, Table>,
}

/// Maps a `SQLite` declared type to an affinity.
#[must_use]
pub fn normalize_sqlite_type(declared: &str) -> &'static str {
    let upper: String = declared.to_uppercase();
    if upper.contains("INT") || upper.contains("BOOL") {
        "integer"
    } else if upper.contains("CHAR") || upper.contains("TEXT") || upper.contains("CLOB") {
        "text"
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        "real"
    } else {
        "other"
    }
}

/// Maps a `MySQL` `DATA_TYPE` to an affinity.
#[must_use]
pub fn normalize_mysql_type(data_type: &str) -> &'static str {
    match data_type.to_lowercase().as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => "integer",
        "char" | "varchar" | "text" | "tinytext" | "mediumtext" | "longtext" => "text",
        "float" | "double" | "real" | "decimal" => "real",
        _ => "other",
    }
}

fn is_bookkeeping(table: &str) -> bool {
    table.starts_with("__diesel") || table.starts_with("sqlite_")
}

#[derive(QueryableByName)]
struct NameRow {
    #[diesel(sql_type = Text)]
    name: String,
}

#[derive(QueryableByName)]
struct SqliteColumnRow {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    declared_type: String,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    notnull: i32,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pk: i32,
}

#[derive(QueryableByName)]
struct SqliteIndexRow {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    is_unique: i32,
    #[diesel(sql_type = Text)]
    origin: String,
}

/// Reads tables, columns and indexes from a migrated `SQLite` database.
///
/// # Errors
///
/// Returns an error if a catalog query fails.
pub fn introspect_sqlite(conn: &mut SqliteConnection) -> Result<Schema> {
    let names: Vec<NameRow> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .load(conn)
    .wrap_err("Failed to list SQLite tables")?;

    let mut schema: Schema = Schema::default();
    for NameRow { name: table } in names {
        if is_bookkeeping(&table) {
            continue;
        }

        let rows: Vec<SqliteColumnRow> = diesel::sql_query(format!(
            "SELECT name, type AS declared_type, \"notnull\", pk FROM pragma_table_info('{table}')"
        ))
        .load(conn)
        .wrap_err_with(|| format!("Failed to read columns of {table}"))?;
        let columns: Vec<Column> = rows
            .into_iter()
            .map(|row| Column {
                affinity: normalize_sqlite_type(&row.declared_type),
                // Primary keys are implicitly NOT NULL in MySQL.
                nullable: row.notnull == 0 && row.pk == 0,
                name: row.name,
            })
            .collect();

        let index_rows: Vec<SqliteIndexRow> = diesel::sql_query(format!(
            "SELECT name, \"unique\" AS is_unique, origin FROM pragma_index_list('{table}')"
        ))
        .load(conn)
        .wrap_err_with(|| format!("Failed to read indexes of {table}"))?;

        let mut indexes: Vec<Index> = Vec::new();
        for row in index_rows {
            // Primary keys are compared through the columns.
            if row.origin == "pk" {
                continue;
            }
            let index_columns: Vec<NameRow> = diesel::sql_query(format!(
                "SELECT name FROM pragma_index_info('{}') ORDER BY seqno",
                row.name
            ))
            .load(conn)
            .wrap_err_with(|| format!("Failed to read index {}", row.name))?;
            indexes.push(Index {
                columns: index_columns.into_iter().map(|c| c.name).collect(),
                unique: row.is_unique != 0,
            });
        }
        indexes.sort();

        schema.tables.insert(table, Table { columns, indexes });
    }

    Ok(schema)
}

#[derive(QueryableByName)]
struct MysqlColumnRow {
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
    #[diesel(sql_type = Text)]
    is_nullable: String,
}

#[derive(QueryableByName)]
struct MysqlIndexRow {
    #[diesel(sql_type = Text)]
    index_name: String,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    non_unique: i32,
    #[diesel(sql_type = Text)]
    column_name: String,
}

/// Reads tables, columns and indexes of `database` from `information_schema`.
///
/// # Errors
///
/// Returns an error if a catalog query fails.
pub fn introspect_mysql(conn: &mut MysqlConnection, database: &str) -> Result<Schema> {
    let names: Vec<NameRow> = diesel::sql_query(
        "SELECT CAST(TABLE_NAME AS CHAR) AS name FROM information_schema.TABLES \
         WHERE TABLE_SCHEMA = ? ORDER BY TABLE_NAME",
    )
    .bind::<Text, _>(database)
    .load(conn)
    .wrap_err("Failed to list MySQL tables")?;

    let mut schema: Schema = Schema::default();
    for NameRow { name: table } in names {
        if is_bookkeeping(&table) {
            continue;
        }

        let rows: Vec<MysqlColumnRow> = diesel::sql_query(
            "SELECT CAST(COLUMN_NAME AS CHAR) AS column_name, \
                    CAST(DATA_TYPE AS CHAR) AS data_type, \
                    CAST(IS_NULLABLE AS CHAR) AS is_nullable \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(table.as_str())
        .load(conn)
        .wrap_err_with(|| format!("Failed to read columns of {table}"))?;
        let columns: Vec<Column> = rows
            .into_iter()
            .map(|row| Column {
                affinity: normalize_mysql_type(&row.data_type),
                nullable: row.is_nullable == "YES",
                name: row.column_name,
            })
            .collect();

        let index_rows: Vec<MysqlIndexRow> = diesel::sql_query(
            "SELECT CAST(INDEX_NAME AS CHAR) AS index_name, \
                    CAST(NON_UNIQUE AS SIGNED) AS non_unique, \
                    CAST(COLUMN_NAME AS CHAR) AS column_name \
             FROM information_schema.STATISTICS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND INDEX_NAME <> 'PRIMARY' \
             ORDER BY INDEX_NAME, SEQ_IN_INDEX",
        )
        .bind::<Text, _>(database)
        .bind::<Text, _>(table.as_str())
        .load(conn)
        .wrap_err_with(|| format!("Failed to read indexes of {table}"))?;

        let mut by_name: BTreeMap<String, Index> = BTreeMap::new();
        for row in index_rows {
            by_name
                .entry(row.index_name)
                .or_insert_with(|| Index {
                    columns: Vec::new(),
                    unique: row.non_unique == 0,
                })
                .columns
                .push(row.column_name);
        }
        let mut indexes: Vec<Index> = by_name.into_values().collect();
        indexes.sort();

        schema.tables.insert(table, Table { columns, indexes });
    }

    Ok(schema)
}

/// Lists every difference between the two schemas. Empty means parity.
///
/// `MySQL` creates a plain index for each foreign key that has none, so
/// non-unique indexes only present on the `MySQL` side are not reported.
#[must_use]
pub fn compare(sqlite: &Schema, mysql: &Schema) -> Vec<String> {
    let mut mismatches: Vec<String> = Vec::new();

    for name in sqlite.tables.keys() {
        if !mysql.tables.contains_key(name) {
            mismatches.push(format!("table {name}: missing in MySQL"));
        }
    }
    for name in mysql.tables.keys() {
        if !sqlite.tables.contains_key(name) {
            mismatches.push(format!("table {name}: missing in SQLite"));
        }
    }

    for (name, left) in &sqlite.tables {
        let Some(right) = mysql.tables.get(name) else {
            continue;
        };

        let left_names: Vec<&str> = left.columns.iter().map(|c| c.name.as_str()).collect();
        let right_names: Vec<&str> = right.columns.iter().map(|c| c.name.as_str()).collect();
        if left_names != right_names {
            mismatches.push(format!(
                "table {name}: columns differ (SQLite {left_names:?}, MySQL {right_names:?})"
            ));
        }

        for column in &left.columns {
            let Some(other) = right.columns.iter().find(|c| c.name == column.name) else {
                continue;
            };
            if column.affinity != other.affinity {
                mismatches.push(format!(
                    "column {name}.{}: type {} in SQLite, {} in MySQL",
                    column.name, column.affinity, other.affinity
                ));
            }
            if column.nullable != other.nullable {
                mismatches.push(format!(
                    "column {name}.{}: nullable {} in SQLite, {} in MySQL",
                    column.name, column.nullable, other.nullable
                ));
            }
        }

        for index in &left.indexes {
            if !right.indexes.contains(index) {
                mismatches.push(format!("table {name}: index {index:?} missing in MySQL"));
            }
        }
        for index in right.indexes.iter().filter(|i| i.unique) {
            if !left.indexes.contains(index) {
                mismatches.push(format!("table {name}: index {index:?} missing in SQLite"));
            }
        }
    }

    mismatches
}
