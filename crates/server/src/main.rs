// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod live;
mod monitor;
mod session;

#[cfg(test)]
mod tests;

use axum::{
    Json, Router,
    extract::{FromRequest, Path, Request, State as AxumState, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use poachcoach_api::{
    ActiveClassStudentsResponse, ApiError, AttendanceStatusResponse, AvailableClassesResponse,
    BookClassResponse, CancelBookingResponse, ChatSessions, CheckEmailRequest,
    CheckEmailResponse, CheckPasswordRequest, CheckPasswordResponse, ClassInfo,
    CoachClassesResponse, CreateClassRequest, LocalChatProvider, LoginRequest, LoginResponse,
    MockPaymentService, NextClassResponse, NotificationsResponse, PayBookingResponse,
    PaymentIntent, PendingPayments, RegisterRequest, RegisterResponse, RetryPolicy, SessionRequest,
    StudentBookingsResponse, SubmitAttendanceRequest, SubmitAttendanceResponse,
    SubmitFeedbackRequest, SubmitFeedbackResponse, TransferReceipt, TransferStatusResponse,
    UserInfo, active_class_students, attendance_status, book_class, cancel_booking, cancel_class,
    check_email, check_password, create_class, list_available_classes, list_coach_classes,
    list_notifications, list_student_bookings, login, logout, mark_notification_read,
    next_class, prepare_payment, record_payment, register_user, submit_attendance,
    submit_feedback, transfer_status, whoami,
};
use poachcoach_domain::{DomainError, LifecyclePolicy, parse_timezone};
use poachcoach_persistence::Persistence;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::live::{LiveEvent, LiveEventBroadcaster, live_events_handler};
use crate::monitor::ClassMonitor;
use crate::session::CurrentUser;

/// `PoachCoach` Server - HTTP backend for the coaching marketplace
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "POACHCOACH_DATABASE")]
    database: Option<String>,

    /// `MySQL`/`MariaDB` connection URL. Takes precedence over `--database`.
    #[arg(long, env = "POACHCOACH_MYSQL_URL", hide_env_values = true)]
    mysql_url: Option<String>,

    /// Address to bind the server to
    #[arg(long, env = "POACHCOACH_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, env = "POACHCOACH_PORT", default_value_t = 3000)]
    port: u16,

    /// Timezone for classes created without one
    #[arg(long, env = "POACHCOACH_DEFAULT_TIMEZONE", default_value = "UTC")]
    default_timezone: String,

    /// How long an ended class stays visible, in minutes
    #[arg(long, env = "POACHCOACH_ENDED_GRACE_MINUTES", default_value_t = 15)]
    ended_grace_minutes: i64,

    /// Minimum notice for a refundable cancellation, in hours
    #[arg(long, env = "POACHCOACH_REFUND_CUTOFF_HOURS", default_value_t = 12)]
    refund_cutoff_hours: i64,

    /// Unpaid bookings are released this many hours before the class starts
    #[arg(long, env = "POACHCOACH_UNPAID_EXPIRY_HOURS", default_value_t = 12)]
    unpaid_expiry_hours: i64,

    /// Seconds between class lifecycle checks
    #[arg(
        long,
        env = "POACHCOACH_MONITOR_INTERVAL_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    monitor_interval_secs: u64,

    /// Artificial delay of the mock payment service, in milliseconds
    #[arg(long, env = "POACHCOACH_PAYMENT_DELAY_MS", default_value_t = 1000)]
    payment_delay_ms: u64,

    /// Chat provider API key. Chat is disabled when absent.
    #[arg(long, env = "STREAM_CHAT_API_KEY", hide_env_values = true)]
    chat_api_key: Option<String>,
}

/// Application state shared across handlers.
///
/// The persistence layer is a single connection behind a mutex. Handlers
/// release it before awaiting the payment or chat services.
#[derive(Clone)]
pub struct AppState {
    /// The persistence layer.
    persistence: Arc<Mutex<Persistence>>,
    /// Lifecycle thresholds.
    policy: LifecyclePolicy,
    /// Timezone for classes created without one.
    default_timezone: String,
    /// Mock bank-transfer service.
    payments: MockPaymentService,
    /// Bookings with a transfer in flight.
    pending_payments: PendingPayments,
    /// Chat client lifecycle.
    chat: ChatSessions,
    /// Live event fan-out.
    live: LiveEventBroadcaster,
}

// ============================================================================
// Errors
// ============================================================================

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::InvalidInput { .. } | ApiError::PasswordPolicyViolation { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal { message } => {
                error!(error = %message, "Internal error");
                return Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: String::from("Internal server error"),
                };
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// JSON body extractor that answers malformed bodies with a 400 `{error}`.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(HttpError {
                status: StatusCode::BAD_REQUEST,
                message: rejection.body_text(),
            }),
        }
    }
}

// ============================================================================
// Plain responses
// ============================================================================

/// API response carrying only a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageResponse {
    message: String,
}

/// API response for the liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    backend: String,
}

// ============================================================================
// Accounts
// ============================================================================

/// Handler for GET `/api/health`.
async fn handle_health(AxumState(app_state): AxumState<AppState>) -> Json<HealthResponse> {
    let persistence = app_state.persistence.lock().await;
    let backend: &str = persistence.backend_name();
    drop(persistence);

    Json(HealthResponse {
        status: String::from("ok"),
        backend: backend.to_string(),
    })
}

/// Handler for POST `/api/sessions`.
///
/// Signs in and connects the user's chat client. A chat failure does not
/// fail the sign-in.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(email = %req.email, "Handling login request");

    let mut persistence = app_state.persistence.lock().await;
    let (response, user) = login(&mut persistence, &req, OffsetDateTime::now_utc())?;
    drop(persistence);

    app_state.chat.connect(&user).await;

    Ok(Json(response))
}

/// Handler for DELETE `/api/sessions`.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, token): CurrentUser,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let remaining: i64 = logout(&mut persistence, &user, &token, OffsetDateTime::now_utc())?;
    drop(persistence);

    if remaining == 0 {
        app_state.chat.disconnect(user.user_id).await;
    }
    info!(user_id = user.user_id, remaining, "Signed out");

    Ok(Json(MessageResponse {
        message: String::from("Signed out"),
    }))
}

/// Handler for POST `/api/user/register`.
async fn handle_register(
    AxumState(app_state): AxumState<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: RegisterResponse = register_user(&mut persistence, &req)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/api/user/check-email`.
async fn handle_check_email(
    AxumState(app_state): AxumState<AppState>,
    ApiJson(req): ApiJson<CheckEmailRequest>,
) -> Result<Json<CheckEmailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: CheckEmailResponse = check_email(&mut persistence, &req)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/api/user/check-password`.
async fn handle_check_password(
    ApiJson(req): ApiJson<CheckPasswordRequest>,
) -> Json<CheckPasswordResponse> {
    Json(check_password(&req))
}

/// Handler for GET `/api/user/me`.
async fn handle_me(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
) -> Result<Json<UserInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let info: UserInfo = whoami(&mut persistence, &user)?;
    drop(persistence);
    Ok(Json(info))
}

// ============================================================================
// Coach
// ============================================================================

/// Handler for POST `/api/coach/classes`.
async fn handle_create_class(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    ApiJson(req): ApiJson<CreateClassRequest>,
) -> Result<Json<ClassInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let class: ClassInfo = create_class(
        &mut persistence,
        &user,
        &req,
        &app_state.default_timezone,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);
    Ok(Json(class))
}

/// Handler for GET `/api/coach/classes`.
async fn handle_list_coach_classes(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
) -> Result<Json<CoachClassesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: CoachClassesResponse = list_coach_classes(
        &mut persistence,
        &user,
        &app_state.policy,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/api/coach/class-management/cancel-class`.
async fn handle_cancel_class(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    ApiJson(req): ApiJson<SessionRequest>,
) -> Result<Json<ClassInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let class: ClassInfo = cancel_class(&mut persistence, &user, &req, OffsetDateTime::now_utc())?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::ClassCancelled {
        session_id: class.session_id,
    });
    Ok(Json(class))
}

/// Handler for POST `/api/coach/class-management/submit-attendance`.
async fn handle_submit_attendance(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    ApiJson(req): ApiJson<SubmitAttendanceRequest>,
) -> Result<Json<SubmitAttendanceResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: SubmitAttendanceResponse = submit_attendance(
        &mut persistence,
        &user,
        &req,
        &app_state.policy,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::AttendanceRecorded {
        session_id: response.session_id,
        student_ids: response.student_ids.clone(),
    });
    Ok(Json(response))
}

// ============================================================================
// Student
// ============================================================================

/// Handler for GET `/api/classes/available`.
async fn handle_available_classes(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
) -> Result<Json<AvailableClassesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: AvailableClassesResponse =
        list_available_classes(&mut persistence, &user, OffsetDateTime::now_utc())?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/api/student/book`.
async fn handle_book_class(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    ApiJson(req): ApiJson<SessionRequest>,
) -> Result<Json<BookClassResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: BookClassResponse =
        book_class(&mut persistence, &user, &req, OffsetDateTime::now_utc())?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::BookingCreated {
        session_id: req.session_id,
        student_id: user.user_id,
    });
    Ok(Json(response))
}

/// Handler for POST `/api/student/pay`.
///
/// The database lock is released while the payment service works. The
/// booking is claimed first so a second payment for it is refused.
async fn handle_pay_booking(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    ApiJson(req): ApiJson<SessionRequest>,
) -> Result<Json<PayBookingResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let intent: PaymentIntent =
        prepare_payment(&mut persistence, &user, &req, OffsetDateTime::now_utc())?;
    let Some(claim) = app_state
        .pending_payments
        .claim(intent.session_id, intent.student_id)
    else {
        drop(persistence);
        return Err(HttpError::from(ApiError::DomainRuleViolation {
            rule: String::from("payment_in_progress"),
            message: String::from("A payment for this booking is already running"),
        }));
    };
    drop(persistence);

    let receipt: TransferReceipt = app_state
        .payments
        .initiate_transfer(intent.amount_cents, &intent.description)
        .await;

    let mut persistence = app_state.persistence.lock().await;
    let recorded: Result<PayBookingResponse, ApiError> =
        record_payment(&mut persistence, &intent, receipt);
    drop(persistence);
    drop(claim);

    let response: PayBookingResponse = recorded?;
    Ok(Json(response))
}

/// Handler for POST `/api/student/cancel-booking`.
async fn handle_cancel_booking(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    ApiJson(req): ApiJson<SessionRequest>,
) -> Result<Json<CancelBookingResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: CancelBookingResponse = cancel_booking(
        &mut persistence,
        &user,
        &req,
        &app_state.policy,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);

    app_state.live.broadcast(LiveEvent::BookingCancelled {
        session_id: req.session_id,
        student_id: user.user_id,
    });
    Ok(Json(response))
}

/// Handler for GET `/api/student/bookings`.
async fn handle_student_bookings(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
) -> Result<Json<StudentBookingsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: StudentBookingsResponse = list_student_bookings(
        &mut persistence,
        &user,
        &app_state.policy,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/api/student/next-class`.
async fn handle_next_class(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
) -> Result<Json<NextClassResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: NextClassResponse =
        next_class(&mut persistence, &user, OffsetDateTime::now_utc())?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/api/student/attendance-status`.
async fn handle_attendance_status(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    ApiJson(req): ApiJson<SessionRequest>,
) -> Result<Json<AttendanceStatusResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: AttendanceStatusResponse = attendance_status(&mut persistence, &user, &req)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/api/student/submit-feedback`.
async fn handle_submit_feedback(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    ApiJson(req): ApiJson<SubmitFeedbackRequest>,
) -> Result<Json<SubmitFeedbackResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: SubmitFeedbackResponse =
        submit_feedback(&mut persistence, &user, &req, OffsetDateTime::now_utc())?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/api/student/active-class-students`.
async fn handle_active_class_students(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    ApiJson(req): ApiJson<SessionRequest>,
) -> Result<Json<ActiveClassStudentsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ActiveClassStudentsResponse = active_class_students(
        &mut persistence,
        &user,
        &req,
        &app_state.policy,
        OffsetDateTime::now_utc(),
    )?;
    drop(persistence);
    Ok(Json(response))
}

// ============================================================================
// Payments & notifications
// ============================================================================

/// Handler for GET `/api/payments/transfers/{reference}`.
async fn handle_transfer_status(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(_, _): CurrentUser,
    Path(reference): Path<String>,
) -> Result<Json<TransferStatusResponse>, HttpError> {
    Ok(Json(transfer_status(&app_state.payments, &reference)?))
}

/// Handler for GET `/api/notifications`.
async fn handle_list_notifications(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
) -> Result<Json<NotificationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: NotificationsResponse = list_notifications(&mut persistence, &user)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/api/notifications/{id}/read`.
async fn handle_mark_notification_read(
    AxumState(app_state): AxumState<AppState>,
    CurrentUser(user, _): CurrentUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    mark_notification_read(&mut persistence, &user, notification_id)?;
    drop(persistence);
    Ok(Json(MessageResponse {
        message: format!("Notification {notification_id} marked read"),
    }))
}

// ============================================================================
// Startup
// ============================================================================

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/sessions", post(handle_login).delete(handle_logout))
        .route("/api/user/register", post(handle_register))
        .route("/api/user/check-email", post(handle_check_email))
        .route("/api/user/check-password", post(handle_check_password))
        .route("/api/user/me", get(handle_me))
        .route(
            "/api/coach/classes",
            post(handle_create_class).get(handle_list_coach_classes),
        )
        .route(
            "/api/coach/class-management/submit-attendance",
            post(handle_submit_attendance),
        )
        .route(
            "/api/coach/class-management/cancel-class",
            post(handle_cancel_class),
        )
        .route("/api/classes/available", get(handle_available_classes))
        .route("/api/student/book", post(handle_book_class))
        .route("/api/student/pay", post(handle_pay_booking))
        .route("/api/student/cancel-booking", post(handle_cancel_booking))
        .route("/api/student/bookings", get(handle_student_bookings))
        .route("/api/student/next-class", get(handle_next_class))
        .route(
            "/api/student/attendance-status",
            post(handle_attendance_status),
        )
        .route("/api/student/submit-feedback", post(handle_submit_feedback))
        .route(
            "/api/student/active-class-students",
            post(handle_active_class_students),
        )
        .route(
            "/api/payments/transfers/{reference}",
            get(handle_transfer_status),
        )
        .route("/api/notifications", get(handle_list_notifications))
        .route(
            "/api/notifications/{id}/read",
            post(handle_mark_notification_read),
        )
        .route("/api/live", get(live_events_handler))
        .with_state(app_state)
}

/// Builds the lifecycle policy from the configured thresholds.
fn build_policy(args: &Args) -> Result<LifecyclePolicy, DomainError> {
    LifecyclePolicy::from_minutes(
        args.ended_grace_minutes,
        args.refund_cutoff_hours.saturating_mul(60),
        args.unpaid_expiry_hours.saturating_mul(60),
    )
}

#[cfg(feature = "mysql")]
fn open_mysql(url: &str) -> Result<Persistence, Box<dyn Error>> {
    info!("Using MySQL/MariaDB database");
    Ok(Persistence::new_with_mysql(url)?)
}

#[cfg(not(feature = "mysql"))]
fn open_mysql(_url: &str) -> Result<Persistence, Box<dyn Error>> {
    Err("MySQL support is not compiled in; rebuild with the `mysql` feature".into())
}

fn open_persistence(args: &Args) -> Result<Persistence, Box<dyn Error>> {
    if let Some(url) = &args.mysql_url {
        return open_mysql(url);
    }
    if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Ok(Persistence::new_with_file(db_path)?)
    } else {
        info!("Using in-memory database");
        Ok(Persistence::new_in_memory()?)
    }
}

fn build_chat(api_key: Option<&str>) -> ChatSessions {
    match api_key.map(str::trim).filter(|key| !key.is_empty()) {
        Some(key) => {
            info!("Chat provider configured");
            ChatSessions::new(Arc::new(LocalChatProvider::new(key)), RetryPolicy::default())
        }
        None => {
            info!("No chat API key, chat disabled");
            ChatSessions::disabled()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing PoachCoach server");

    let policy: LifecyclePolicy = build_policy(&args)?;
    parse_timezone(&args.default_timezone)?;

    let persistence: Arc<Mutex<Persistence>> = Arc::new(Mutex::new(open_persistence(&args)?));
    let live: LiveEventBroadcaster = LiveEventBroadcaster::new();

    let _monitor = ClassMonitor::new(
        Arc::clone(&persistence),
        live.clone(),
        Duration::from_secs(args.monitor_interval_secs),
    )
    .spawn();

    let app_state: AppState = AppState {
        persistence,
        policy,
        default_timezone: args.default_timezone.clone(),
        payments: MockPaymentService::new(Duration::from_millis(args.payment_delay_ms)),
        pending_payments: PendingPayments::new(),
        chat: build_chat(args.chat_api_key.as_deref()),
        live,
    };

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
