// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions.
//!
//! Handlers are synchronous and take the persistence adapter plus the
//! current instant, so every time rule can be tested with a fixed clock.
//! Anything that has to wait on an external service (payments, chat) is
//! split so the caller can release the database between the steps.

use std::collections::HashSet;
use std::str::FromStr;

use poachcoach_domain::{
    AttendanceStatus, Booking, ClassPhase, ClassSchedule, ClassType, CoachingSession,
    DomainError, LifecyclePolicy, PaymentStatus, RefundQuote, SessionStatus, UserRole,
    attendance_open, auto_expire_unpaid, classify, format_12h, format_date, is_expired_unpaid,
    next_upcoming, refund_window, validate_comment, validate_email, validate_full_name,
    validate_rating, validate_session_fields, within_grace,
};
use poachcoach_persistence::{
    AttendanceData, EnrollmentData, NotificationData, Persistence, UserData,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::auth::{AuthenticatedUser, AuthenticationService, AuthorizationService, LoginOutcome};
use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::password_policy::{PasswordPolicy, PasswordRequirement};
use crate::payments::{MockPaymentService, TransferReceipt};
use crate::request_response::{
    ActiveClassStudentsResponse, AttendanceStatusResponse, AvailableClassesResponse,
    BookClassResponse, BookingInfo, CancelBookingResponse, CheckEmailRequest,
    CheckEmailResponse, CheckPasswordRequest, CheckPasswordResponse, ClassInfo,
    CoachClassesResponse, CreateClassRequest, LoginRequest, LoginResponse, NextClassResponse,
    NotificationInfo, NotificationsResponse, PayBookingResponse, PaymentIntent,
    RegisterRequest, RegisterResponse, RosterEntry, SessionRequest, StudentBookingsResponse,
    SubmitAttendanceRequest, SubmitAttendanceResponse, SubmitFeedbackRequest,
    SubmitFeedbackResponse, TransferStatusResponse, UserInfo,
};

// ============================================================================
// Shared helpers
// ============================================================================

fn user_info(user: &UserData) -> UserInfo {
    UserInfo {
        user_id: user.user_id,
        email: user.email.clone(),
        role: user.role.to_string(),
        full_name: user.full_name.clone(),
        phone: user.phone.clone(),
    }
}

fn rule(rule: &str, message: impl Into<String>) -> ApiError {
    ApiError::DomainRuleViolation {
        rule: rule.to_string(),
        message: message.into(),
    }
}

fn not_found(resource_type: &str, message: impl Into<String>) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: resource_type.to_string(),
        message: message.into(),
    }
}

/// Builds the public view of a stored session, phase included.
///
/// # Errors
///
/// Returns an error if the session has no identifier or its schedule
/// cannot be resolved.
pub fn class_info(session: &CoachingSession, now: OffsetDateTime) -> Result<ClassInfo, ApiError> {
    let session_id: i64 = session.session_id.ok_or_else(|| ApiError::Internal {
        message: String::from("Stored session has no identifier"),
    })?;
    let phase: ClassPhase = classify(session, now).map_err(translate_domain_error)?;

    Ok(ClassInfo {
        session_id,
        coach_id: session.coach_id,
        sport: session.sport.clone(),
        date: session.schedule.date_string(),
        start_time: session.schedule.start_string(),
        end_time: session.schedule.end_string(),
        start_time_display: format_12h(session.schedule.start_time()),
        timezone: session.schedule.timezone().to_string(),
        location: session.location.clone(),
        price_cents: session.price_cents,
        class_type: session.class_type.to_string(),
        max_students: session.max_students,
        enrolled: session.student_ids.len(),
        status: session.status.to_string(),
        phase,
    })
}

/// Turns sessions into their public view, keeping only those still inside
/// the grace window. Sessions whose schedule cannot be resolved are logged
/// and skipped.
fn visible_class_infos(
    sessions: &[CoachingSession],
    now: OffsetDateTime,
    policy: &LifecyclePolicy,
) -> Vec<ClassInfo> {
    sessions
        .iter()
        .filter_map(|session| {
            let visible: Result<bool, DomainError> = within_grace(session, now, policy);
            match visible {
                Ok(true) => match class_info(session, now) {
                    Ok(info) => Some(info),
                    Err(err) => {
                        warn!(session_id = ?session.session_id, error = %err, "Skipping session");
                        None
                    }
                },
                Ok(false) => None,
                Err(err) => {
                    warn!(session_id = ?session.session_id, error = %err, "Skipping session with invalid schedule");
                    None
                }
            }
        })
        .collect()
}

fn load_session(
    persistence: &mut Persistence,
    session_id: i64,
) -> Result<CoachingSession, ApiError> {
    persistence
        .get_session(session_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| not_found("Session", format!("Session {session_id} does not exist")))
}

fn load_enrollment(
    persistence: &mut Persistence,
    session_id: i64,
    student_id: i64,
) -> Result<EnrollmentData, ApiError> {
    persistence
        .get_enrollment(session_id, student_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| {
            not_found(
                "Booking",
                format!("No booking for session {session_id}"),
            )
        })
}

/// Stores a notification. Failures are logged and do not undo the action
/// that triggered the notification.
fn notify(persistence: &mut Persistence, user_id: i64, title: &str, body: &str) {
    if let Err(err) = persistence.create_notification(user_id, title, body) {
        warn!(user_id, error = %err, "Failed to store notification");
    }
}

fn describe_class(session: &CoachingSession) -> String {
    format!(
        "{} on {} at {}",
        session.sport,
        session.schedule.date_string(),
        format_12h(session.schedule.start_time())
    )
}

// ============================================================================
// Accounts
// ============================================================================

/// Signs a user in.
///
/// # Errors
///
/// Returns an error if the credentials are wrong or storage fails.
pub fn login(
    persistence: &mut Persistence,
    request: &LoginRequest,
    now: OffsetDateTime,
) -> Result<(LoginResponse, AuthenticatedUser), ApiError> {
    let outcome: LoginOutcome =
        AuthenticationService::login(persistence, &request.email, &request.password, now)?;

    let user: UserData = persistence
        .get_user_by_id(outcome.user.user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| not_found("User", "Signed-in user disappeared"))?;

    Ok((
        LoginResponse {
            session_token: outcome.session_token,
            expires_at: outcome.expires_at,
            user: user_info(&user),
        },
        outcome.user,
    ))
}

/// Signs a user out by deleting their token.
///
/// Returns the number of live sessions the user keeps elsewhere. Chat is
/// per user, so it should only be disconnected when this reaches zero.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn logout(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    session_token: &str,
    now: OffsetDateTime,
) -> Result<i64, ApiError> {
    AuthenticationService::logout(persistence, session_token, actor.user_id, now)
}

/// Registers a student or coach account.
///
/// # Errors
///
/// Returns an error if:
/// - The email, name or role is invalid
/// - The password does not meet the policy
/// - The email is already registered
pub fn register_user(
    persistence: &mut Persistence,
    request: &RegisterRequest,
) -> Result<RegisterResponse, ApiError> {
    let email: String = validate_email(&request.email).map_err(translate_domain_error)?;
    let full_name: String =
        validate_full_name(&request.full_name).map_err(translate_domain_error)?;
    let role: UserRole = UserRole::from_str(&request.role).map_err(translate_domain_error)?;

    PasswordPolicy::default().validate(&request.password, &request.confirm_password, &email)?;

    if persistence
        .email_exists(&email)
        .map_err(translate_persistence_error)?
    {
        return Err(rule("unique_email", "Email is already registered"));
    }

    let phone: Option<&str> = request
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let user_id: i64 = persistence
        .create_user(&email, &request.password, role, &full_name, phone)
        .map_err(translate_persistence_error)?;

    let user: UserData = persistence
        .get_user_by_id(user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| not_found("User", format!("User {user_id} was not stored")))?;

    info!(user_id, role = %role, "Registered user");

    Ok(RegisterResponse {
        user: user_info(&user),
        message: format!("Registered {role} account for {email}"),
    })
}

/// Reports whether an email is still free.
///
/// # Errors
///
/// Returns an error if the email is malformed or storage fails.
pub fn check_email(
    persistence: &mut Persistence,
    request: &CheckEmailRequest,
) -> Result<CheckEmailResponse, ApiError> {
    let email: String = validate_email(&request.email).map_err(translate_domain_error)?;
    let taken: bool = persistence
        .email_exists(&email)
        .map_err(translate_persistence_error)?;

    Ok(CheckEmailResponse {
        email,
        available: !taken,
    })
}

/// Lists every password requirement the candidate does not meet.
#[must_use]
pub fn check_password(request: &CheckPasswordRequest) -> CheckPasswordResponse {
    let unmet_requirements: Vec<PasswordRequirement> =
        PasswordPolicy::default().unmet_requirements(&request.password);

    CheckPasswordResponse {
        valid: unmet_requirements.is_empty(),
        unmet_requirements,
    }
}

/// Returns the signed-in user.
///
/// # Errors
///
/// Returns an error if the user no longer exists or storage fails.
pub fn whoami(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
) -> Result<UserInfo, ApiError> {
    let user: UserData = persistence
        .get_user_by_id(actor.user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| not_found("User", format!("User {} does not exist", actor.user_id)))?;
    Ok(user_info(&user))
}

// ============================================================================
// Coach: classes and attendance
// ============================================================================

/// Creates a coaching session owned by the calling coach.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `actor` - The calling coach
/// * `request` - The session details
/// * `default_timezone` - Timezone used when the request names none
/// * `now` - The current instant
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not a coach
/// - Any field is invalid or the capacity does not fit the class type
/// - The session would start in the past
pub fn create_class(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    request: &CreateClassRequest,
    default_timezone: &str,
    now: OffsetDateTime,
) -> Result<ClassInfo, ApiError> {
    AuthorizationService::authorize_coach(actor, "create_class")?;

    let class_type: ClassType =
        ClassType::from_str(&request.class_type).map_err(translate_domain_error)?;
    let max_students: i32 = match (class_type, request.max_students) {
        (_, Some(max)) => max,
        (ClassType::Individual, None) => 1,
        (ClassType::Group, None) => {
            return Err(translate_domain_error(DomainError::MissingField(
                "max_students",
            )));
        }
    };

    let timezone: &str = request
        .timezone
        .as_deref()
        .map(str::trim)
        .filter(|tz| !tz.is_empty())
        .unwrap_or(default_timezone);
    let schedule: ClassSchedule = ClassSchedule::parse(
        &request.date,
        &request.start_time,
        &request.end_time,
        timezone,
    )
    .map_err(translate_domain_error)?;

    let mut session: CoachingSession = CoachingSession::new(
        actor.user_id,
        request.sport.trim().to_string(),
        schedule,
        request.location.trim().to_string(),
        request.price_cents,
        class_type,
        max_students,
    );
    validate_session_fields(&session).map_err(translate_domain_error)?;

    if classify(&session, now).map_err(translate_domain_error)? != ClassPhase::Upcoming {
        return Err(rule(
            "class_in_past",
            "A class can only be created before it starts",
        ));
    }

    let session_id: i64 = persistence
        .insert_session(&session)
        .map_err(translate_persistence_error)?;
    session.session_id = Some(session_id);

    info!(session_id, coach_id = actor.user_id, sport = %session.sport, "Created class");

    class_info(&session, now)
}

/// Lists the calling coach's sessions that have not ended longer ago than
/// the grace period.
///
/// # Errors
///
/// Returns an error if the caller is not a coach or storage fails.
pub fn list_coach_classes(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    policy: &LifecyclePolicy,
    now: OffsetDateTime,
) -> Result<CoachClassesResponse, ApiError> {
    AuthorizationService::authorize_coach(actor, "list_classes")?;

    let sessions: Vec<CoachingSession> = persistence
        .list_sessions_for_coach(actor.user_id)
        .map_err(translate_persistence_error)?;

    Ok(CoachClassesResponse {
        classes: visible_class_infos(&sessions, now, policy),
    })
}

/// Cancels an upcoming session and tells every enrolled student.
///
/// Paid bookings are refunded in full whatever the refund cutoff. The
/// enrollments stay in place with status `refunded`.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not the session's coach
/// - The session is already cancelled or has started
pub fn cancel_class(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    request: &SessionRequest,
    now: OffsetDateTime,
) -> Result<ClassInfo, ApiError> {
    let mut session: CoachingSession = load_session(persistence, request.session_id)?;
    AuthorizationService::authorize_session_owner(actor, &session, "cancel_class")?;

    if session.status == SessionStatus::Cancelled {
        return Err(rule("session_cancelled", "Class is already cancelled"));
    }
    if classify(&session, now).map_err(translate_domain_error)? != ClassPhase::Upcoming {
        return Err(rule(
            "class_already_started",
            "A class can only be cancelled before it starts",
        ));
    }

    persistence
        .set_session_status(request.session_id, SessionStatus::Cancelled)
        .map_err(translate_persistence_error)?;
    session.status = SessionStatus::Cancelled;

    let description: String = describe_class(&session);
    let mut refunded: usize = 0;
    for student_id in &session.student_ids {
        let enrollment: Option<EnrollmentData> = persistence
            .get_enrollment(request.session_id, *student_id)
            .map_err(translate_persistence_error)?;
        let paid: bool = enrollment.is_some_and(|e| e.payment_status == PaymentStatus::Paid);

        let body: String = if paid {
            persistence
                .set_payment_status(request.session_id, *student_id, PaymentStatus::Refunded)
                .map_err(translate_persistence_error)?;
            refunded += 1;
            format!(
                "{description} was cancelled by the coach, {} cents refunded",
                session.price_cents
            )
        } else {
            format!("{description} was cancelled by the coach")
        };
        notify(persistence, *student_id, "Class cancelled", &body);
    }

    info!(session_id = request.session_id, refunded, "Cancelled class");

    class_info(&session, now)
}

/// Records attendance for one or more students of a session.
///
/// The whole batch is validated before anything is written. Each record is
/// then upserted on its own, and a later submission overwrites an earlier
/// one for the same student.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not the session's coach
/// - The session is cancelled, has not started, or ended longer ago than the grace period
/// - The batch is empty, repeats a student, names a student who is not
///   enrolled, or carries an unknown status
pub fn submit_attendance(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    request: &SubmitAttendanceRequest,
    policy: &LifecyclePolicy,
    now: OffsetDateTime,
) -> Result<SubmitAttendanceResponse, ApiError> {
    let session: CoachingSession = load_session(persistence, request.session_id)?;
    AuthorizationService::authorize_session_owner(actor, &session, "submit_attendance")?;

    if session.status == SessionStatus::Cancelled {
        return Err(rule("session_cancelled", "Class was cancelled"));
    }
    if !attendance_open(&session, now, policy).map_err(translate_domain_error)? {
        return Err(rule(
            "attendance_window",
            "Attendance can only be recorded while the class is running or shortly after",
        ));
    }
    if request.records.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("records"),
            message: String::from("At least one attendance record is required"),
        });
    }

    let mut seen: HashSet<i64> = HashSet::new();
    let mut parsed: Vec<(i64, AttendanceStatus)> = Vec::with_capacity(request.records.len());
    for entry in &request.records {
        if !seen.insert(entry.student_id) {
            return Err(ApiError::InvalidInput {
                field: String::from("records"),
                message: format!("Student {} appears more than once", entry.student_id),
            });
        }
        if !session.has_student(entry.student_id) {
            return Err(rule(
                "student_not_enrolled",
                format!("Student {} is not enrolled in this class", entry.student_id),
            ));
        }
        let status: AttendanceStatus =
            AttendanceStatus::from_str(&entry.status).map_err(translate_domain_error)?;
        parsed.push((entry.student_id, status));
    }

    let mut student_ids: Vec<i64> = Vec::with_capacity(parsed.len());
    for (student_id, status) in parsed {
        persistence
            .upsert_attendance(request.session_id, student_id, status, actor.user_id)
            .map_err(translate_persistence_error)?;
        notify(
            persistence,
            student_id,
            "Attendance recorded",
            &format!("You were marked {status} for {}", describe_class(&session)),
        );
        student_ids.push(student_id);
    }

    info!(
        session_id = request.session_id,
        count = student_ids.len(),
        "Recorded attendance"
    );

    Ok(SubmitAttendanceResponse {
        session_id: request.session_id,
        message: format!("Recorded attendance for {} student(s)", student_ids.len()),
        student_ids,
    })
}

// ============================================================================
// Discovery and bookings
// ============================================================================

/// Lists upcoming scheduled sessions that still have room.
///
/// Students do not see sessions they already booked.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn list_available_classes(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    now: OffsetDateTime,
) -> Result<AvailableClassesResponse, ApiError> {
    // Local dates run up to a day behind UTC.
    let from_date: String = format_date((now - Duration::days(1)).date());
    let sessions: Vec<CoachingSession> = persistence
        .list_scheduled_sessions_from(&from_date)
        .map_err(translate_persistence_error)?;

    let classes: Vec<ClassInfo> = sessions
        .iter()
        .filter(|s| s.accepts_bookings() && !s.has_student(actor.user_id))
        .filter_map(|s| match class_info(s, now) {
            Ok(info) if info.phase == ClassPhase::Upcoming => Some(info),
            Ok(_) => None,
            Err(err) => {
                warn!(session_id = ?s.session_id, error = %err, "Skipping session with invalid schedule");
                None
            }
        })
        .collect();

    Ok(AvailableClassesResponse { classes })
}

/// Books the calling student into a session with an unpaid enrollment.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not a student
/// - The session is cancelled, already started, or full
/// - The student already booked it
pub fn book_class(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    request: &SessionRequest,
    now: OffsetDateTime,
) -> Result<BookClassResponse, ApiError> {
    AuthorizationService::authorize_student(actor, "book_class")?;
    let session: CoachingSession = load_session(persistence, request.session_id)?;

    if session.status == SessionStatus::Cancelled {
        return Err(rule("session_cancelled", "Class was cancelled"));
    }
    if classify(&session, now).map_err(translate_domain_error)? != ClassPhase::Upcoming {
        return Err(rule(
            "booking_closed",
            "A class can only be booked before it starts",
        ));
    }
    if session.has_student(actor.user_id) {
        return Err(rule("already_booked", "You already booked this class"));
    }
    if session.remaining_capacity() == 0 {
        return Err(rule("class_full", "Class is full"));
    }

    persistence
        .enroll_student(request.session_id, actor.user_id)
        .map_err(translate_persistence_error)?;

    notify(
        persistence,
        session.coach_id,
        "New booking",
        &format!("{} booked {}", actor.full_name, describe_class(&session)),
    );

    let session: CoachingSession = load_session(persistence, request.session_id)?;
    info!(
        session_id = request.session_id,
        student_id = actor.user_id,
        "Booked class"
    );

    Ok(BookClassResponse {
        booking: BookingInfo {
            class: class_info(&session, now)?,
            payment_status: PaymentStatus::Unpaid,
        },
        message: format!("Booked {}", describe_class(&session)),
    })
}

fn student_bookings(
    persistence: &mut Persistence,
    student_id: i64,
) -> Result<Vec<Booking>, ApiError> {
    let rows: Vec<(EnrollmentData, CoachingSession)> = persistence
        .list_bookings_for_student(student_id)
        .map_err(translate_persistence_error)?;
    Ok(rows
        .into_iter()
        .map(|(enrollment, session)| Booking::new(session, student_id, enrollment.payment_status))
        .collect())
}

fn booking_info(booking: &Booking, now: OffsetDateTime) -> Result<BookingInfo, ApiError> {
    Ok(BookingInfo {
        class: class_info(&booking.session, now)?,
        payment_status: booking.payment_status,
    })
}

/// Lists the calling student's bookings.
///
/// Unpaid bookings for classes starting within the expiry window are
/// released first, which frees their seat. Bookings for classes that ended
/// longer ago than the grace period are left out.
///
/// # Errors
///
/// Returns an error if the caller is not a student or storage fails.
pub fn list_student_bookings(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    policy: &LifecyclePolicy,
    now: OffsetDateTime,
) -> Result<StudentBookingsResponse, ApiError> {
    AuthorizationService::authorize_student(actor, "list_bookings")?;

    let mut resolvable: Vec<Booking> = Vec::new();
    for booking in student_bookings(persistence, actor.user_id)? {
        match within_grace(&booking, now, policy) {
            Ok(true) => resolvable.push(booking),
            Ok(false) => {}
            Err(err) => {
                warn!(session_id = ?booking.session.session_id, error = %err, "Skipping booking with invalid schedule");
            }
        }
    }

    let mut expired_session_ids: Vec<i64> = Vec::new();
    for booking in &resolvable {
        let Some(session_id) = booking.session.session_id else {
            continue;
        };
        if booking.session.status == SessionStatus::Scheduled
            && is_expired_unpaid(booking, now, policy).map_err(translate_domain_error)?
        {
            persistence
                .remove_enrollment(session_id, actor.user_id)
                .map_err(translate_persistence_error)?;
            info!(session_id, student_id = actor.user_id, "Released expired unpaid booking");
            expired_session_ids.push(session_id);
        }
    }

    let kept: Vec<Booking> =
        auto_expire_unpaid(resolvable, now, policy).map_err(translate_domain_error)?;

    let bookings: Vec<BookingInfo> = kept
        .iter()
        .map(|booking| booking_info(booking, now))
        .collect::<Result<Vec<BookingInfo>, ApiError>>()?;

    Ok(StudentBookingsResponse {
        bookings,
        expired_session_ids,
    })
}

/// Returns the calling student's next upcoming booked class.
///
/// # Errors
///
/// Returns an error if the caller is not a student or storage fails.
pub fn next_class(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    now: OffsetDateTime,
) -> Result<NextClassResponse, ApiError> {
    AuthorizationService::authorize_student(actor, "next_class")?;

    let candidates: Vec<Booking> = student_bookings(persistence, actor.user_id)?
        .into_iter()
        .filter(|b| b.session.status == SessionStatus::Scheduled)
        .filter(|b| match b.session.schedule.start_instant() {
            Ok(_) => true,
            Err(err) => {
                warn!(session_id = ?b.session.session_id, error = %err, "Skipping booking with invalid schedule");
                false
            }
        })
        .collect();

    let next: Option<&Booking> = next_upcoming(&candidates, now).map_err(translate_domain_error)?;

    Ok(NextClassResponse {
        next_class: next.map(|booking| booking_info(booking, now)).transpose()?,
    })
}

/// Validates a payment for a booking before the transfer is started.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not a student or has no booking for the session
/// - The booking is already paid or refunded
/// - The session is cancelled or already ended
pub fn prepare_payment(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    request: &SessionRequest,
    now: OffsetDateTime,
) -> Result<PaymentIntent, ApiError> {
    AuthorizationService::authorize_student(actor, "pay_booking")?;
    let session: CoachingSession = load_session(persistence, request.session_id)?;
    let enrollment: EnrollmentData =
        load_enrollment(persistence, request.session_id, actor.user_id)?;

    if enrollment.payment_status != PaymentStatus::Unpaid {
        return Err(rule(
            "already_paid",
            format!("Booking is already {}", enrollment.payment_status),
        ));
    }
    if session.status == SessionStatus::Cancelled {
        return Err(rule("session_cancelled", "Class was cancelled"));
    }
    if classify(&session, now).map_err(translate_domain_error)? == ClassPhase::Ended {
        return Err(rule("class_ended", "Class has already ended"));
    }

    Ok(PaymentIntent {
        session_id: request.session_id,
        student_id: actor.user_id,
        amount_cents: session.price_cents,
        description: describe_class(&session),
    })
}

/// Marks a booking paid once its transfer was initiated.
///
/// The booking is checked again because the database was released while
/// the transfer ran. When it was cancelled, released or paid meanwhile the
/// transfer reference is logged so it can be reconciled by hand.
///
/// # Errors
///
/// Returns an error if:
/// - The booking no longer exists
/// - The booking is no longer unpaid
/// - Storage fails
pub fn record_payment(
    persistence: &mut Persistence,
    intent: &PaymentIntent,
    transfer: TransferReceipt,
) -> Result<PayBookingResponse, ApiError> {
    let enrollment: Option<EnrollmentData> = persistence
        .get_enrollment(intent.session_id, intent.student_id)
        .map_err(translate_persistence_error)?;

    let Some(enrollment) = enrollment else {
        warn!(
            session_id = intent.session_id,
            student_id = intent.student_id,
            reference = %transfer.reference,
            "Booking released during transfer, transfer left unreconciled"
        );
        return Err(rule(
            "booking_released",
            format!(
                "Booking was cancelled before the payment completed, transfer {} needs a refund",
                transfer.reference
            ),
        ));
    };
    if enrollment.payment_status != PaymentStatus::Unpaid {
        warn!(
            session_id = intent.session_id,
            student_id = intent.student_id,
            reference = %transfer.reference,
            payment_status = %enrollment.payment_status,
            "Booking settled during transfer, transfer left unreconciled"
        );
        return Err(rule(
            "already_paid",
            format!(
                "Booking is already {}, transfer {} needs a refund",
                enrollment.payment_status, transfer.reference
            ),
        ));
    }

    persistence
        .set_payment_status(intent.session_id, intent.student_id, PaymentStatus::Paid)
        .map_err(translate_persistence_error)?;

    info!(
        session_id = intent.session_id,
        student_id = intent.student_id,
        reference = %transfer.reference,
        "Booking paid"
    );

    Ok(PayBookingResponse {
        session_id: intent.session_id,
        payment_status: PaymentStatus::Paid,
        transfer,
    })
}

/// Polls a mock transfer.
///
/// # Errors
///
/// Returns an error if the reference is blank.
pub fn transfer_status(
    payments: &MockPaymentService,
    reference: &str,
) -> Result<TransferStatusResponse, ApiError> {
    let reference: &str = reference.trim();
    if reference.is_empty() {
        return Err(translate_domain_error(DomainError::MissingField(
            "reference",
        )));
    }
    Ok(TransferStatusResponse {
        reference: reference.to_string(),
        status: payments.check_transfer_status(reference),
    })
}

/// Cancels the calling student's booking and applies the refund window.
///
/// A paid booking cancelled at least the refund cutoff before the start
/// is refunded in full. A class the coach cancelled is always refunded.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not a student or has no booking for the session
/// - The class has already started
pub fn cancel_booking(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    request: &SessionRequest,
    policy: &LifecyclePolicy,
    now: OffsetDateTime,
) -> Result<CancelBookingResponse, ApiError> {
    AuthorizationService::authorize_student(actor, "cancel_booking")?;
    let session: CoachingSession = load_session(persistence, request.session_id)?;
    let enrollment: EnrollmentData =
        load_enrollment(persistence, request.session_id, actor.user_id)?;

    let mut refund: RefundQuote =
        refund_window(&session, now, policy).map_err(translate_domain_error)?;
    if session.status == SessionStatus::Cancelled {
        refund.eligible = true;
        refund.amount_cents = session.price_cents;
    } else if classify(&session, now).map_err(translate_domain_error)? != ClassPhase::Upcoming {
        return Err(rule(
            "class_already_started",
            "A booking can only be cancelled before the class starts",
        ));
    }

    let refunded: bool = enrollment.payment_status == PaymentStatus::Paid && refund.eligible;
    let payment_status: PaymentStatus = if refunded {
        PaymentStatus::Refunded
    } else {
        enrollment.payment_status
    };
    let refunded_cents: i64 = if refunded { refund.amount_cents } else { 0 };

    persistence
        .remove_enrollment(request.session_id, actor.user_id)
        .map_err(translate_persistence_error)?;

    notify(
        persistence,
        session.coach_id,
        "Booking cancelled",
        &format!("{} cancelled {}", actor.full_name, describe_class(&session)),
    );

    info!(
        session_id = request.session_id,
        student_id = actor.user_id,
        refunded_cents,
        "Cancelled booking"
    );

    let message: String = if refunded {
        format!("Booking cancelled, {refunded_cents} cents refunded")
    } else if enrollment.payment_status == PaymentStatus::Refunded {
        String::from("Booking cancelled, already refunded")
    } else {
        String::from("Booking cancelled, no refund")
    };

    Ok(CancelBookingResponse {
        session_id: request.session_id,
        refund,
        refunded_cents,
        payment_status,
        message,
    })
}

// ============================================================================
// Student: attendance, roster, feedback
// ============================================================================

/// Returns the calling student's attendance for a session.
///
/// # Errors
///
/// Returns an error if the caller is not a student or has no booking.
pub fn attendance_status(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    request: &SessionRequest,
) -> Result<AttendanceStatusResponse, ApiError> {
    AuthorizationService::authorize_student(actor, "attendance_status")?;
    load_session(persistence, request.session_id)?;
    load_enrollment(persistence, request.session_id, actor.user_id)?;

    let record: Option<AttendanceData> = persistence
        .get_attendance(request.session_id, actor.user_id)
        .map_err(translate_persistence_error)?;

    Ok(AttendanceStatusResponse {
        session_id: request.session_id,
        status: record.map(|r| r.status),
    })
}

/// Returns the roster of a session that is running or inside its grace
/// window, with attendance recorded so far.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is neither the coach nor an enrolled student
/// - The session is cancelled or not currently active
pub fn active_class_students(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    request: &SessionRequest,
    policy: &LifecyclePolicy,
    now: OffsetDateTime,
) -> Result<ActiveClassStudentsResponse, ApiError> {
    let session: CoachingSession = load_session(persistence, request.session_id)?;
    AuthorizationService::authorize_roster_access(actor, &session)?;

    if session.status == SessionStatus::Cancelled
        || !attendance_open(&session, now, policy).map_err(translate_domain_error)?
    {
        return Err(rule("class_not_active", "Class is not currently active"));
    }

    let mut students: Vec<RosterEntry> = Vec::with_capacity(session.student_ids.len());
    for student_id in &session.student_ids {
        let Some(user) = persistence
            .get_user_by_id(*student_id)
            .map_err(translate_persistence_error)?
        else {
            warn!(student_id, "Enrolled student has no user record");
            continue;
        };
        let attendance: Option<AttendanceData> = persistence
            .get_attendance(request.session_id, *student_id)
            .map_err(translate_persistence_error)?;
        students.push(RosterEntry {
            student_id: *student_id,
            full_name: user.full_name,
            email: user.email,
            attendance: attendance.map(|a| a.status),
        });
    }

    Ok(ActiveClassStudentsResponse {
        class: class_info(&session, now)?,
        students,
    })
}

/// Stores the calling student's rating for a class they attended.
///
/// # Errors
///
/// Returns an error if:
/// - The rating or comment is invalid
/// - The caller has no booking or the class has not started
/// - Feedback was already submitted
pub fn submit_feedback(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    request: &SubmitFeedbackRequest,
    now: OffsetDateTime,
) -> Result<SubmitFeedbackResponse, ApiError> {
    AuthorizationService::authorize_student(actor, "submit_feedback")?;
    validate_rating(request.rating).map_err(translate_domain_error)?;
    let comment: Option<String> =
        validate_comment(request.comment.as_deref()).map_err(translate_domain_error)?;

    let session: CoachingSession = load_session(persistence, request.session_id)?;
    load_enrollment(persistence, request.session_id, actor.user_id)?;

    if session.status == SessionStatus::Cancelled {
        return Err(rule("session_cancelled", "Class was cancelled"));
    }
    if classify(&session, now).map_err(translate_domain_error)? == ClassPhase::Upcoming {
        return Err(rule(
            "class_not_started",
            "Feedback opens once the class has started",
        ));
    }
    if persistence
        .get_feedback(request.session_id, actor.user_id)
        .map_err(translate_persistence_error)?
        .is_some()
    {
        return Err(rule(
            "feedback_already_submitted",
            "Feedback was already submitted for this class",
        ));
    }

    let feedback_id: i64 = persistence
        .insert_feedback(
            request.session_id,
            actor.user_id,
            request.rating,
            comment.as_deref(),
        )
        .map_err(translate_persistence_error)?;

    info!(
        session_id = request.session_id,
        student_id = actor.user_id,
        rating = request.rating,
        "Feedback submitted"
    );

    Ok(SubmitFeedbackResponse {
        feedback_id,
        message: String::from("Thanks for your feedback"),
    })
}

// ============================================================================
// Notifications
// ============================================================================

/// Lists the caller's notifications, newest first.
///
/// # Errors
///
/// Returns an error if storage fails.
pub fn list_notifications(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
) -> Result<NotificationsResponse, ApiError> {
    let rows: Vec<NotificationData> = persistence
        .list_notifications(actor.user_id)
        .map_err(translate_persistence_error)?;

    let unread: usize = rows.iter().filter(|n| !n.is_read).count();
    let notifications: Vec<NotificationInfo> = rows
        .into_iter()
        .map(|n| NotificationInfo {
            notification_id: n.notification_id,
            title: n.title,
            body: n.body,
            is_read: n.is_read,
            created_at: n.created_at,
        })
        .collect();

    Ok(NotificationsResponse {
        notifications,
        unread,
    })
}

/// Marks one of the caller's notifications read.
///
/// # Errors
///
/// Returns an error if the notification does not belong to the caller.
pub fn mark_notification_read(
    persistence: &mut Persistence,
    actor: &AuthenticatedUser,
    notification_id: i64,
) -> Result<(), ApiError> {
    persistence
        .mark_notification_read(notification_id, actor.user_id)
        .map_err(|err| match err {
            poachcoach_persistence::PersistenceError::NotFound(_) => not_found(
                "Notification",
                format!("Notification {notification_id} does not exist"),
            ),
            other => translate_persistence_error(other),
        })
}
