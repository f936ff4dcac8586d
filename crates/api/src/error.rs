// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::password_policy::PasswordPolicyError;
use poachcoach_domain::DomainError;
use poachcoach_persistence::PersistenceError;
use tracing::error;

/// Failures from [`crate::AuthenticationService`] and
/// [`crate::AuthorizationService`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },
    #[error("Unauthorized: '{action}' requires {required_role} role")]
    Unauthorized {
        action: String,
        required_role: String,
    },
}

/// Errors at the API boundary.
///
/// Domain and persistence errors are translated into these before they
/// leave the crate. The server maps each variant to one HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing, wrong or expired credentials.
    AuthenticationFailed { reason: String },
    /// The caller's role or ownership does not allow the action.
    Unauthorized {
        action: String,
        required_role: String,
    },
    /// A booking, attendance or feedback rule rejected the request.
    ///
    /// `rule` is a stable key such as `class_full`.
    DomainRuleViolation { rule: String, message: String },
    /// A request field failed validation.
    InvalidInput { field: String, message: String },
    /// The referenced class, booking, user or notification does not exist.
    ResourceNotFound {
        resource_type: String,
        message: String,
    },
    /// Storage or another dependency failed. Not shown to clients.
    Internal { message: String },
    /// The password does not meet the policy.
    PasswordPolicyViolation { message: String },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err {
        DomainError::InvalidScheduleData { field, .. } => ApiError::InvalidInput {
            field: field.to_string(),
            message,
        },
        DomainError::InvalidTimezone(_) => invalid("timezone", message),
        DomainError::InvalidRole(_) => invalid("role", message),
        DomainError::InvalidClassType(_) => invalid("class_type", message),
        DomainError::InvalidSessionStatus(_) | DomainError::InvalidAttendanceStatus(_) => {
            invalid("status", message)
        }
        DomainError::InvalidPaymentStatus(_) => invalid("payment_status", message),
        DomainError::InvalidEmail(_) => invalid("email", message),
        DomainError::InvalidName(_) => invalid("full_name", message),
        DomainError::InvalidSport(_) => invalid("sport", message),
        DomainError::InvalidLocation(_) => invalid("location", message),
        DomainError::InvalidPrice(_) => invalid("price_cents", message),
        DomainError::InvalidCapacity { .. } => invalid("max_students", message),
        DomainError::InvalidRating(_) => invalid("rating", message),
        DomainError::CommentTooLong { .. } => invalid("comment", message),
        DomainError::MissingField(field) => invalid(field, message),
        DomainError::InvalidPolicy(_) | DomainError::DateArithmeticOverflow { .. } => {
            ApiError::Internal { message }
        }
    }
}

/// Translates a persistence error into an API error.
///
/// Constraint violations become rule violations; storage failures become
/// internal errors and are logged here since the message is not returned
/// to clients.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::UniqueViolation(message) => ApiError::DomainRuleViolation {
            rule: String::from("unique_record"),
            message,
        },
        PersistenceError::NotFound(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message,
        },
        PersistenceError::ForeignKeyViolation(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Referenced record"),
            message,
        },
        other => {
            error!(error = %other, "Persistence failure");
            ApiError::Internal {
                message: other.to_string(),
            }
        }
    }
}

fn invalid(field: &str, message: String) -> ApiError {
    ApiError::InvalidInput {
        field: field.to_string(),
        message,
    }
}
