// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask
//!
//! Developer automation for the workspace, run as `cargo xtask <command>`.
//!
//! `cargo test` only ever touches `SQLite`. Everything that needs a real
//! `MariaDB` server is opt-in and lives here:
//!
//! - `cargo xtask test-mariadb` runs the ignored backend validation tests
//!   of `poachcoach-persistence` against a throwaway container
//! - `cargo xtask verify-migrations` applies both migration directories and
//!   checks that they produce the same schema

#![deny(
    clippy::pedantic,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

mod mariadb;
mod schema;

use std::{io, process::Output};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    eyre::{eyre, Context},
    Result,
};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

use crate::mariadb::MariaDbContainer;
use crate::schema::Schema;

/// Package holding the backend validation tests.
const PERSISTENCE_PACKAGE: &str = "poachcoach-persistence";

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    if let Err(err) = args.command.run() {
        tracing::error!("{err:?}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Lint, build and test: everything CI runs without Docker
    Ci,

    /// Build every target
    #[command(visible_alias = "b")]
    Build,

    /// Type-check every target
    #[command(visible_alias = "c")]
    Check,

    /// Run the linters
    #[command(visible_alias = "l")]
    Lint {
        /// Run a single linter instead of all of them
        #[arg(long, value_enum)]
        only: Option<Linter>,
    },

    /// Format the workspace with nightly rustfmt
    Fmt {
        /// Fail on unformatted code instead of rewriting it
        #[arg(long)]
        check: bool,
    },

    /// Run unit and doc tests on `SQLite`
    #[command(visible_alias = "t")]
    Test,

    /// Run the persistence backend tests against a `MariaDB` container
    #[command(visible_alias = "tm")]
    TestMariadb,

    /// Check that both migration directories build the same schema
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Linter {
    Clippy,
    Docs,
    Fmt,
}

impl Linter {
    const ALL: [Self; 3] = [Self::Clippy, Self::Docs, Self::Fmt];

    fn run(self) -> Result<()> {
        match self {
            Self::Clippy => clippy(),
            Self::Docs => docs(),
            Self::Fmt => rustfmt(true),
        }
    }
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::Ci => {
                lint(None)?;
                cargo(&["build", "--all-targets"])?;
                test()
            }
            Self::Build => cargo(&["build", "--all-targets"]),
            Self::Check => cargo(&["check", "--all-targets"]),
            Self::Lint { only } => lint(only),
            Self::Fmt { check } => rustfmt(check),
            Self::Test => test(),
            Self::TestMariadb => test_mariadb(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

fn lint(only: Option<Linter>) -> Result<()> {
    match only {
        Some(linter) => linter.run(),
        None => Linter::ALL.into_iter().try_for_each(Linter::run),
    }
}

/// Clippy runs on the default `SQLite` build and again with the `MySQL`
/// backend compiled in.
fn clippy() -> Result<()> {
    cargo(&["clippy", "--all-targets", "--", "-D", "warnings"])?;
    cargo(&[
        "clippy",
        "--all-targets",
        "--package",
        PERSISTENCE_PACKAGE,
        "--features",
        "mysql",
        "--",
        "-D",
        "warnings",
    ])
}

/// Builds docs for each workspace member with warnings denied.
fn docs() -> Result<()> {
    let metadata = MetadataCommand::new()
        .exec()
        .wrap_err("cargo metadata failed")?;

    metadata
        .workspace_default_packages()
        .into_iter()
        .try_for_each(|package| {
            cmd!("cargo", "doc", "--no-deps", "--package", package.name.as_str())
                .env_remove("CARGO")
                .env("RUSTDOCFLAGS", "-D warnings")
                .run_with_trace()
                .map(drop)
                .wrap_err_with(|| format!("docs for {} failed", package.name.as_str()))
        })
}

fn rustfmt(check: bool) -> Result<()> {
    let mut args: Vec<&str> = vec!["fmt", "--all"];
    if check {
        args.push("--check");
    }
    cmd("cargo", args)
        // Inside `cargo xtask`, CARGO points at the stable toolchain.
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

fn test() -> Result<()> {
    cargo(&["test", "--all-targets"])?;
    cargo(&["test", "--doc"])
}

/// Runs the ignored backend validation tests against a fresh container.
///
/// The tests read `DATABASE_URL` and refuse to run unless
/// `POACHCOACH_TEST_BACKEND=mariadb` is set. The container is removed
/// whether or not the tests pass.
fn test_mariadb() -> Result<()> {
    let container: MariaDbContainer = MariaDbContainer::start("poachcoach-test-mariadb", 3307)?;

    cmd!(
        "cargo",
        "test",
        "--package",
        PERSISTENCE_PACKAGE,
        "--features",
        "mysql",
        "backend_validation_tests",
        "--",
        "--ignored",
        "--test-threads=1"
    )
    .env("DATABASE_URL", container.url())
    .env("POACHCOACH_TEST_BACKEND", "mariadb")
    .run_with_trace()
    .wrap_err("MariaDB backend tests failed")?;

    tracing::info!("MariaDB backend tests passed");
    Ok(())
}

/// Applies both migration directories and compares the resulting schemas.
fn verify_migrations() -> Result<()> {
    use diesel::{Connection, MysqlConnection, SqliteConnection};
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const SQLITE: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");
    const MYSQL: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations_mysql");

    let mut sqlite: SqliteConnection =
        SqliteConnection::establish(":memory:").wrap_err("cannot open in-memory SQLite")?;
    sqlite
        .run_pending_migrations(SQLITE)
        .map_err(|e| eyre!("SQLite migrations failed: {e}"))?;
    let sqlite_schema: Schema = schema::introspect_sqlite(&mut sqlite)?;

    let container: MariaDbContainer =
        MariaDbContainer::start("poachcoach-verify-migrations", 3308)?;
    let mut mysql: MysqlConnection =
        MysqlConnection::establish(&container.url()).wrap_err("cannot connect to MariaDB")?;
    mysql
        .run_pending_migrations(MYSQL)
        .map_err(|e| eyre!("MySQL migrations failed: {e}"))?;
    let mysql_schema: Schema = schema::introspect_mysql(&mut mysql, mariadb::DATABASE)?;
    drop(mysql);

    let mismatches: Vec<String> = schema::compare(&sqlite_schema, &mysql_schema);
    if !mismatches.is_empty() {
        return Err(eyre!(
            "{} schema mismatch(es):\n{}",
            mismatches.len(),
            mismatches.join("\n")
        ));
    }

    tracing::info!(
        tables = sqlite_schema.tables.len(),
        "Migrations produce identical schemas"
    );
    Ok(())
}

fn cargo(args: &[&str]) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

/// Logs a `duct` command before running it.
trait ExpressionExt {
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
