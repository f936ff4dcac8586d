// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{ClassType, CoachingSession};

/// Largest group class a coach may create.
pub const MAX_GROUP_SIZE: i32 = 50;

/// Longest accepted feedback comment, in characters.
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Longest accepted free-text field (names, sport, location).
pub const MAX_TEXT_LENGTH: usize = 200;

/// Validates and normalizes an email address.
///
/// Emails are compared case-insensitively, so the normalized form is
/// trimmed and lowercased.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` if the address is not of the form
/// `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<String, DomainError> {
    let normalized: String = email.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(DomainError::InvalidEmail(String::from(
            "Email cannot be empty",
        )));
    }

    if normalized.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidEmail(String::from(
            "Email cannot contain whitespace",
        )));
    }

    let Some((local, domain)) = normalized.split_once('@') else {
        return Err(DomainError::InvalidEmail(String::from(
            "Email must contain '@'",
        )));
    };

    if local.is_empty() || domain.contains('@') {
        return Err(DomainError::InvalidEmail(format!(
            "'{normalized}' is not a valid address"
        )));
    }

    // Rule: domain needs a dot with something on both sides
    let valid_domain: bool = domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());
    if !valid_domain {
        return Err(DomainError::InvalidEmail(format!(
            "'{normalized}' has an invalid domain"
        )));
    }

    Ok(normalized)
}

/// Validates a person's display name and returns it trimmed.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the name is blank or too long.
pub fn validate_full_name(name: &str) -> Result<String, DomainError> {
    let trimmed: &str = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "Name cannot be empty",
        )));
    }
    if trimmed.chars().count() > MAX_TEXT_LENGTH {
        return Err(DomainError::InvalidName(format!(
            "Name must be at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validates that a capacity fits the class type.
///
/// Individual classes hold exactly one student. Group classes hold
/// between 2 and [`MAX_GROUP_SIZE`].
///
/// # Errors
///
/// Returns `DomainError::InvalidCapacity` on mismatch.
pub fn validate_capacity(class_type: ClassType, max_students: i32) -> Result<(), DomainError> {
    let valid: bool = match class_type {
        ClassType::Individual => max_students == 1,
        ClassType::Group => (2..=MAX_GROUP_SIZE).contains(&max_students),
    };
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidCapacity {
            class_type: class_type.to_string(),
            max_students,
        })
    }
}

/// Validates a new session before it is stored.
///
/// This checks field shapes only. Ownership and timing rules need context
/// and are enforced by the caller.
///
/// # Errors
///
/// Returns an error if:
/// - The sport or location is blank or too long
/// - The price is negative
/// - The capacity does not fit the class type
/// - More students are enrolled than the capacity allows
pub fn validate_session_fields(session: &CoachingSession) -> Result<(), DomainError> {
    let sport: &str = session.sport.trim();
    if sport.is_empty() || sport.chars().count() > MAX_TEXT_LENGTH {
        return Err(DomainError::InvalidSport(format!(
            "Sport must be between 1 and {MAX_TEXT_LENGTH} characters"
        )));
    }

    let location: &str = session.location.trim();
    if location.is_empty() || location.chars().count() > MAX_TEXT_LENGTH {
        return Err(DomainError::InvalidLocation(format!(
            "Location must be between 1 and {MAX_TEXT_LENGTH} characters"
        )));
    }

    if session.price_cents < 0 {
        return Err(DomainError::InvalidPrice(session.price_cents));
    }

    validate_capacity(session.class_type, session.max_students)?;

    let enrolled: i32 = i32::try_from(session.student_ids.len()).unwrap_or(i32::MAX);
    if enrolled > session.max_students {
        return Err(DomainError::InvalidCapacity {
            class_type: session.class_type.to_string(),
            max_students: session.max_students,
        });
    }

    Ok(())
}

/// Validates a 1 to 5 star rating.
///
/// # Errors
///
/// Returns `DomainError::InvalidRating` outside that range.
pub fn validate_rating(rating: i32) -> Result<(), DomainError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(DomainError::InvalidRating(rating))
    }
}

/// Validates an optional feedback comment and returns it trimmed.
///
/// Blank comments become `None`.
///
/// # Errors
///
/// Returns `DomainError::CommentTooLong` past [`MAX_COMMENT_LENGTH`].
pub fn validate_comment(comment: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(text) = comment.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_COMMENT_LENGTH {
        return Err(DomainError::CommentTooLong {
            max: MAX_COMMENT_LENGTH,
        });
    }
    Ok(Some(text.to_string()))
}
