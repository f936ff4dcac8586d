// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use poachcoach_domain::{CoachingSession, UserRole};
use poachcoach_persistence::{
    AuthSessionData, Persistence, UserData, format_timestamp, parse_timestamp,
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::error::{ApiError, AuthError, translate_persistence_error};

/// A signed-in user as seen by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The user's identifier.
    pub user_id: i64,
    /// The normalized email address.
    pub email: String,
    /// Whether the user is a student or a coach.
    pub role: UserRole,
    /// The user's display name.
    pub full_name: String,
}

impl AuthenticatedUser {
    /// Creates an authenticated user from a stored user row.
    #[must_use]
    pub fn from_user(user: &UserData) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.clone(),
            role: user.role,
            full_name: user.full_name.clone(),
        }
    }
}

/// Authorization service for enforcing role and ownership rules.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that the user has the given role.
    ///
    /// # Arguments
    ///
    /// * `user` - The authenticated user
    /// * `role` - The role the action requires
    /// * `action` - The action name, used in the error
    ///
    /// # Errors
    ///
    /// Returns an error if the user has a different role.
    pub fn require_role(
        user: &AuthenticatedUser,
        role: UserRole,
        action: &str,
    ) -> Result<(), AuthError> {
        if user.role == role {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: role.to_string(),
            })
        }
    }

    /// Checks that the user is a coach.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is a student.
    pub fn authorize_coach(user: &AuthenticatedUser, action: &str) -> Result<(), AuthError> {
        Self::require_role(user, UserRole::Coach, action)
    }

    /// Checks that the user is a student.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is a coach.
    pub fn authorize_student(user: &AuthenticatedUser, action: &str) -> Result<(), AuthError> {
        Self::require_role(user, UserRole::Student, action)
    }

    /// Checks that a coach owns the session they are managing.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not a coach or not this session's coach.
    pub fn authorize_session_owner(
        user: &AuthenticatedUser,
        session: &CoachingSession,
        action: &str,
    ) -> Result<(), AuthError> {
        Self::authorize_coach(user, action)?;
        if session.coach_id == user.user_id {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("owning coach"),
            })
        }
    }

    /// Checks that the user may see a session's roster: its coach or one of
    /// its enrolled students.
    ///
    /// # Errors
    ///
    /// Returns an error for anyone else.
    pub fn authorize_roster_access(
        user: &AuthenticatedUser,
        session: &CoachingSession,
    ) -> Result<(), AuthError> {
        let allowed: bool = match user.role {
            UserRole::Coach => session.coach_id == user.user_id,
            UserRole::Student => session.has_student(user.user_id),
        };
        if allowed {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: String::from("view_roster"),
                required_role: String::from("owning coach or enrolled student"),
            })
        }
    }
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// The opaque bearer token.
    pub session_token: String,
    /// The signed-in user.
    pub user: AuthenticatedUser,
    /// When the token stops being accepted, in storage format.
    pub expires_at: String,
}

/// Authentication service for bearer-token sessions.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Default session expiration duration (30 days).
    pub const DEFAULT_SESSION_EXPIRATION: Duration = Duration::days(30);

    /// Verifies credentials and creates a session.
    ///
    /// Unknown emails and wrong passwords fail with the same message.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `email` - The account email, any case
    /// * `password` - The plain-text password
    /// * `now` - The current instant
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are wrong or storage fails.
    pub fn login(
        persistence: &mut Persistence,
        email: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<LoginOutcome, ApiError> {
        let user: UserData = persistence
            .get_user_by_email(email)
            .map_err(translate_persistence_error)?
            .ok_or_else(Self::bad_credentials)?;

        let password_ok: bool = Persistence::verify_password(password, &user.password_hash)
            .map_err(translate_persistence_error)?;
        if !password_ok {
            warn!(user_id = user.user_id, "Rejected sign-in with wrong password");
            return Err(Self::bad_credentials());
        }

        let session_token: String = Self::generate_session_token(now);
        let expires_at: String = format_timestamp(now + Self::DEFAULT_SESSION_EXPIRATION)
            .map_err(translate_persistence_error)?;

        persistence
            .create_auth_session(&session_token, user.user_id, &expires_at)
            .map_err(translate_persistence_error)?;
        persistence
            .update_last_login(user.user_id)
            .map_err(translate_persistence_error)?;

        info!(user_id = user.user_id, role = %user.role, "User signed in");

        Ok(LoginOutcome {
            session_token,
            user: AuthenticatedUser::from_user(&user),
            expires_at,
        })
    }

    /// Validates a bearer token and returns the user it belongs to.
    ///
    /// Expired tokens are deleted on sight.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is unknown or expired, or storage fails.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
        now: OffsetDateTime,
    ) -> Result<AuthenticatedUser, ApiError> {
        let session: AuthSessionData = persistence
            .get_auth_session_by_token(session_token)
            .map_err(translate_persistence_error)?
            .ok_or_else(|| {
                ApiError::from(AuthError::AuthenticationFailed {
                    reason: String::from("Invalid session token"),
                })
            })?;

        let expires_at: OffsetDateTime =
            parse_timestamp(&session.expires_at).map_err(translate_persistence_error)?;
        if now > expires_at {
            debug!(user_id = session.user_id, "Discarding expired session");
            persistence
                .delete_auth_session(session_token)
                .map_err(translate_persistence_error)?;
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            }
            .into());
        }

        let user: UserData = persistence
            .get_user_by_id(session.user_id)
            .map_err(translate_persistence_error)?
            .ok_or_else(|| {
                ApiError::from(AuthError::AuthenticationFailed {
                    reason: String::from("User not found"),
                })
            })?;

        persistence
            .update_auth_session_activity(session.auth_session_id)
            .map_err(translate_persistence_error)?;

        Ok(AuthenticatedUser::from_user(&user))
    }

    /// Logs out by deleting the session.
    ///
    /// Returns how many live sessions the user still has on other devices.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout fails.
    pub fn logout(
        persistence: &mut Persistence,
        session_token: &str,
        user_id: i64,
        now: OffsetDateTime,
    ) -> Result<i64, ApiError> {
        persistence
            .delete_auth_session(session_token)
            .map_err(translate_persistence_error)?;

        let now: String = format_timestamp(now).map_err(translate_persistence_error)?;
        persistence
            .count_live_auth_sessions(user_id, &now)
            .map_err(translate_persistence_error)
    }

    /// Builds an opaque token from the sign-in instant and a random suffix.
    fn generate_session_token(now: OffsetDateTime) -> String {
        format!(
            "session_{}_{}",
            now.unix_timestamp_nanos(),
            rand::random::<u64>()
        )
    }

    fn bad_credentials() -> ApiError {
        AuthError::AuthenticationFailed {
            reason: String::from("Invalid email or password"),
        }
        .into()
    }
}
