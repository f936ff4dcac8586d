// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password policy validation.
//!
//! This module enforces password requirements for user accounts and
//! reports which requirements a candidate password still misses.

use serde::Serialize;
use thiserror::Error;

/// Password policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    /// Password is too short.
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    /// Password lacks one or more required character classes.
    #[error("Password must contain {}", describe(.missing))]
    MissingCharacterClasses { missing: Vec<PasswordRequirement> },

    /// Password matches a forbidden value.
    #[error("Password must not match {field}")]
    MatchesForbiddenField { field: String },

    /// Password and confirmation do not match.
    #[error("Password and confirmation do not match")]
    ConfirmationMismatch,
}

/// A single password requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordRequirement {
    /// At least the minimum number of characters.
    MinLength,
    /// At least one uppercase letter.
    Uppercase,
    /// At least one lowercase letter.
    Lowercase,
    /// At least one digit.
    Digit,
    /// At least one symbol.
    Symbol,
}

impl PasswordRequirement {
    /// Returns a short human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::MinLength => "enough characters",
            Self::Uppercase => "an uppercase letter",
            Self::Lowercase => "a lowercase letter",
            Self::Digit => "a digit",
            Self::Symbol => "a symbol",
        }
    }
}

fn describe(missing: &[PasswordRequirement]) -> String {
    missing
        .iter()
        .map(PasswordRequirement::description)
        .collect::<Vec<&str>>()
        .join(", ")
}

/// Password policy configuration.
pub struct PasswordPolicy {
    /// Minimum password length in characters.
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordPolicy {
    /// Validates a password against the policy.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to validate
    /// * `confirmation` - The password confirmation
    /// * `email` - The account email (password must not match)
    ///
    /// # Errors
    ///
    /// Returns a `PasswordPolicyError` if the password does not meet policy requirements.
    pub fn validate(
        &self,
        password: &str,
        confirmation: &str,
        email: &str,
    ) -> Result<(), PasswordPolicyError> {
        if password != confirmation {
            return Err(PasswordPolicyError::ConfirmationMismatch);
        }

        if password.chars().count() < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }

        let missing: Vec<PasswordRequirement> = Self::missing_character_classes(password);
        if !missing.is_empty() {
            return Err(PasswordPolicyError::MissingCharacterClasses { missing });
        }

        if password.to_lowercase() == email.trim().to_lowercase() {
            return Err(PasswordPolicyError::MatchesForbiddenField {
                field: String::from("email"),
            });
        }

        Ok(())
    }

    /// Lists every requirement the password does not meet yet.
    ///
    /// An empty list means the password is strong enough.
    #[must_use]
    pub fn unmet_requirements(&self, password: &str) -> Vec<PasswordRequirement> {
        let mut unmet: Vec<PasswordRequirement> = Vec::new();
        if password.chars().count() < self.min_length {
            unmet.push(PasswordRequirement::MinLength);
        }
        unmet.extend(Self::missing_character_classes(password));
        unmet
    }

    fn missing_character_classes(password: &str) -> Vec<PasswordRequirement> {
        let mut missing: Vec<PasswordRequirement> = Vec::new();
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            missing.push(PasswordRequirement::Uppercase);
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            missing.push(PasswordRequirement::Lowercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            missing.push(PasswordRequirement::Digit);
        }
        if !password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            missing.push(PasswordRequirement::Symbol);
        }
        missing
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        let policy: PasswordPolicy = PasswordPolicy::default();
        assert!(
            policy
                .validate("Str0ng!pw", "Str0ng!pw", "coach@example.com")
                .is_ok()
        );
    }

    #[test]
    fn test_exactly_min_length_is_accepted() {
        let policy: PasswordPolicy = PasswordPolicy::default();
        assert!(policy.validate("Ab1!efgh", "Ab1!efgh", "a@b.co").is_ok());
        assert_eq!(
            policy.validate("Ab1!efg", "Ab1!efg", "a@b.co"),
            Err(PasswordPolicyError::TooShort { min_length: 8 })
        );
    }

    #[test]
    fn test_confirmation_checked_first() {
        let policy: PasswordPolicy = PasswordPolicy::default();
        assert_eq!(
            policy.validate("short", "other", "a@b.co"),
            Err(PasswordPolicyError::ConfirmationMismatch)
        );
    }

    #[test]
    fn test_missing_classes_reported_together() {
        let policy: PasswordPolicy = PasswordPolicy::default();
        let result: Result<(), PasswordPolicyError> =
            policy.validate("alllowercase", "alllowercase", "a@b.co");

        assert_eq!(
            result,
            Err(PasswordPolicyError::MissingCharacterClasses {
                missing: vec![
                    PasswordRequirement::Uppercase,
                    PasswordRequirement::Digit,
                    PasswordRequirement::Symbol,
                ],
            })
        );
        let message: String = result.unwrap_err().to_string();
        assert!(message.contains("an uppercase letter"));
        assert!(message.contains("a symbol"));
    }

    #[test]
    fn test_password_equal_to_email_rejected() {
        let policy: PasswordPolicy = PasswordPolicy::default();
        assert_eq!(
            policy.validate("A1!b@c.co", "A1!b@c.co", "a1!B@C.co"),
            Err(PasswordPolicyError::MatchesForbiddenField {
                field: String::from("email"),
            })
        );
    }

    #[test]
    fn test_unmet_requirements_lists_everything() {
        let policy: PasswordPolicy = PasswordPolicy::default();

        assert_eq!(
            policy.unmet_requirements(""),
            vec![
                PasswordRequirement::MinLength,
                PasswordRequirement::Uppercase,
                PasswordRequirement::Lowercase,
                PasswordRequirement::Digit,
                PasswordRequirement::Symbol,
            ]
        );
        assert_eq!(
            policy.unmet_requirements("Abcdefg1"),
            vec![PasswordRequirement::Symbol]
        );
        assert!(policy.unmet_requirements("Abcdefg1#").is_empty());
    }
}
