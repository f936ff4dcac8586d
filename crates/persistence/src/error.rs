// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Step of opening a database that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    Connect,
    Configure,
    Migrate,
}

impl SetupStage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Configure => "configure",
            Self::Migrate => "migrate",
        }
    }
}

/// Errors returned by [`crate::Persistence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The database could not be opened or prepared.
    Setup {
        stage: SetupStage,
        message: String,
    },
    /// The connection does not enforce foreign keys.
    ForeignKeyEnforcementNotEnabled,
    /// An insert collided with a unique constraint.
    UniqueViolation(String),
    /// A foreign key pointed at a missing row.
    ForeignKeyViolation(String),
    /// No row matched.
    NotFound(String),
    /// A stored row could not be turned back into a domain value.
    DataIntegrity(String),
    /// Hashing or verifying a password failed.
    PasswordHash(String),
    /// Any other database failure.
    Database(String),
}

impl PersistenceError {
    pub(crate) fn setup(stage: SetupStage, err: impl std::fmt::Display) -> Self {
        Self::Setup {
            stage,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup { stage, message } => {
                write!(f, "Database setup failed ({}): {message}", stage.as_str())
            }
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::UniqueViolation(msg) => write!(f, "Duplicate record: {msg}"),
            Self::ForeignKeyViolation(msg) => write!(f, "Referenced record missing: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DataIntegrity(msg) => write!(f, "Stored data is invalid: {msg}"),
            Self::PasswordHash(msg) => write!(f, "Password hashing failed: {msg}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound(String::from("Record not found")),
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().into()),
                DatabaseErrorKind::ForeignKeyViolation => {
                    Self::ForeignKeyViolation(info.message().into())
                }
                _ => Self::Database(info.message().into()),
            },
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<poachcoach_domain::DomainError> for PersistenceError {
    fn from(err: poachcoach_domain::DomainError) -> Self {
        Self::DataIntegrity(err.to_string())
    }
}
