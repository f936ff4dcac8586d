// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helpers that drive the router in-process.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use poachcoach_api::{
    AuthenticationService, ChatSessions, LocalChatProvider, MockPaymentService, PendingPayments,
    RetryPolicy,
};
use poachcoach_domain::{
    ClassSchedule, ClassType, CoachingSession, LifecyclePolicy, UserRole, format_24h, format_date,
};
use poachcoach_persistence::Persistence;
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::live::LiveEventBroadcaster;
use crate::{AppState, build_router};

pub const PASSWORD: &str = "Sup3r!secret";

pub struct TestServer {
    pub app: Router,
    pub state: AppState,
    pub chat: Arc<LocalChatProvider>,
}

pub fn test_server() -> TestServer {
    let persistence: Persistence = Persistence::new_in_memory().unwrap();
    let chat: Arc<LocalChatProvider> = Arc::new(LocalChatProvider::new("test-key"));
    let state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        policy: LifecyclePolicy::default(),
        default_timezone: String::from("UTC"),
        payments: MockPaymentService::new(StdDuration::ZERO),
        pending_payments: PendingPayments::new(),
        chat: ChatSessions::new(chat.clone(), RetryPolicy::default()),
        live: LiveEventBroadcaster::new(),
    };
    TestServer {
        app: build_router(state.clone()),
        state,
        chat,
    }
}

/// Sends a request and returns the status and the decoded JSON body
/// (`Value::Null` when the body is empty).
pub async fn send(
    server: &TestServer,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request: Request<Body> = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = server.app.clone().oneshot(request).await.unwrap();
    let status: StatusCode = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Creates an account and signs it in, returning the user id and token.
pub async fn signed_in(
    server: &TestServer,
    email: &str,
    role: UserRole,
    full_name: &str,
) -> (i64, String) {
    let mut persistence = server.state.persistence.lock().await;
    let user_id: i64 = persistence
        .create_user(email, PASSWORD, role, full_name, None)
        .unwrap();
    let outcome = AuthenticationService::login(
        &mut persistence,
        email,
        PASSWORD,
        OffsetDateTime::now_utc(),
    )
    .unwrap();
    (user_id, outcome.session_token)
}

/// A date `days` from today (UTC), `YYYY-MM-DD`.
pub fn days_from_now(days: i64) -> String {
    format_date((OffsetDateTime::now_utc() + Duration::days(days)).date())
}

/// Stores a UTC class that started twenty minutes ago and runs for an hour.
pub async fn insert_running_class(server: &TestServer, coach_id: i64) -> i64 {
    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let start: OffsetDateTime = now - Duration::minutes(20);
    let end: OffsetDateTime = now + Duration::minutes(40);
    let session: CoachingSession = CoachingSession::new(
        coach_id,
        String::from("Tennis"),
        ClassSchedule::parse(
            &format_date(start.date()),
            &format_24h(start.time()),
            &format_24h(end.time()),
            "UTC",
        )
        .unwrap(),
        String::from("Court 3"),
        4500,
        ClassType::Group,
        4,
    );
    server
        .state
        .persistence
        .lock()
        .await
        .insert_session(&session)
        .unwrap()
}
