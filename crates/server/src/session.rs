// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bearer-token extraction for authenticated routes.
//!
//! Every route that needs a signed-in user takes a [`CurrentUser`]. The
//! token is checked before any route logic runs.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use poachcoach_api::{AuthenticatedUser, AuthenticationService};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{AppState, ErrorResponse};

/// The signed-in user and the token they presented.
///
/// Extraction fails with 401 when the header is missing or is not a
/// bearer token, or when `AuthenticationService::validate_session` rejects
/// the token. Expired tokens are deleted as they are rejected.
pub struct CurrentUser(pub AuthenticatedUser, pub String);

/// Pulls the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, SessionError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(SessionError::MissingAuthorizationHeader);
    };
    let Ok(value) = value.to_str() else {
        return Err(SessionError::InvalidAuthorizationHeader);
    };
    let Some((scheme, token)) = value.split_once(' ') else {
        return Err(SessionError::InvalidAuthorizationHeader);
    };
    let token: &str = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(SessionError::InvalidAuthorizationHeader);
    }
    Ok(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token: &str = bearer_token(&parts.headers).inspect_err(|err| {
            debug!(error = %err, "Rejected Authorization header");
        })?;

        let mut persistence = state.persistence.lock().await;
        let validated =
            AuthenticationService::validate_session(&mut persistence, token, OffsetDateTime::now_utc());
        drop(persistence);

        let user: AuthenticatedUser = validated.map_err(|err| {
            warn!(error = %err, "Bearer token rejected");
            SessionError::InvalidSession(err.to_string())
        })?;

        Ok(Self(user, token.to_string()))
    }
}

/// Session extraction errors.
#[derive(Debug)]
pub enum SessionError {
    /// Authorization header is missing.
    MissingAuthorizationHeader,
    /// Authorization header is not a bearer token.
    InvalidAuthorizationHeader,
    /// The token is unknown or expired.
    InvalidSession(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAuthorizationHeader => write!(f, "Missing Authorization header"),
            Self::InvalidAuthorizationHeader => write!(
                f,
                "Invalid Authorization header format. Expected: 'Bearer <token>'"
            ),
            Self::InvalidSession(reason) => write!(f, "{reason}"),
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: self.to_string(),
        });
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_is_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc123")).ok(), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer  abc123 ")).ok(), Some("abc123"));
    }

    #[test]
    fn test_missing_header_is_distinguished() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(SessionError::MissingAuthorizationHeader)
        ));
    }

    #[test]
    fn test_other_schemes_and_empty_tokens_are_rejected() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer ", "Bearer", "abc123"] {
            assert!(
                matches!(
                    bearer_token(&headers(value)),
                    Err(SessionError::InvalidAuthorizationHeader)
                ),
                "{value}"
            );
        }
    }
}
