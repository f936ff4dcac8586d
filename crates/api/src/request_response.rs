// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Requests deserialize straight from JSON bodies. Enum-like fields arrive
//! as strings and are parsed by the handlers so a bad value becomes a field
//! error rather than a body rejection.

use poachcoach_domain::{AttendanceStatus, ClassPhase, PaymentStatus, RefundQuote};
use serde::{Deserialize, Serialize};

use crate::password_policy::PasswordRequirement;
use crate::payments::TransferReceipt;

// ============================================================================
// Accounts
// ============================================================================

/// API request to sign in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    /// The account email.
    pub email: String,
    /// The account password.
    pub password: String,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// The user's identifier.
    pub user_id: i64,
    /// The normalized email address.
    pub email: String,
    /// `student` or `coach`.
    pub role: String,
    /// Display name.
    pub full_name: String,
    /// Optional phone number.
    pub phone: Option<String>,
}

/// API response for a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The bearer token (opaque).
    pub session_token: String,
    /// Session expiration timestamp (RFC 3339, UTC).
    pub expires_at: String,
    /// The signed-in user.
    pub user: UserInfo,
}

/// API request to register an account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    /// The account email.
    pub email: String,
    /// The chosen password.
    pub password: String,
    /// The password typed a second time.
    pub confirm_password: String,
    /// `student` or `coach`.
    pub role: String,
    /// Display name.
    pub full_name: String,
    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

/// API response for a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// The new user.
    pub user: UserInfo,
    /// A success message.
    pub message: String,
}

/// API request to check whether an email is still free.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckEmailRequest {
    /// The email to check.
    pub email: String,
}

/// API response for an email availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEmailResponse {
    /// The normalized email.
    pub email: String,
    /// Whether no account uses it yet.
    pub available: bool,
}

/// API request to rate a candidate password.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckPasswordRequest {
    /// The candidate password.
    pub password: String,
}

/// API response listing unmet password requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckPasswordResponse {
    /// Whether every requirement is met.
    pub valid: bool,
    /// The requirements not met yet.
    pub unmet_requirements: Vec<PasswordRequirement>,
}

// ============================================================================
// Classes
// ============================================================================

/// API request to create a coaching session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateClassRequest {
    /// The sport being coached.
    pub sport: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Start time, `HH:MM` in 24-hour form.
    pub start_time: String,
    /// End time, `HH:MM` in 24-hour form.
    pub end_time: String,
    /// IANA timezone; the server default is used when absent.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Where the session takes place.
    pub location: String,
    /// Price per student in cents.
    pub price_cents: i64,
    /// `individual` or `group`.
    pub class_type: String,
    /// Capacity; defaults to one for individual classes.
    #[serde(default)]
    pub max_students: Option<i32>,
}

/// Public view of a coaching session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// The session identifier.
    pub session_id: i64,
    /// The coach running it.
    pub coach_id: i64,
    /// The sport being coached.
    pub sport: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Start time, `HH:MM`.
    pub start_time: String,
    /// End time, `HH:MM`.
    pub end_time: String,
    /// Start time for display, `h:MM AM`.
    pub start_time_display: String,
    /// IANA timezone of the times above.
    pub timezone: String,
    /// Where the session takes place.
    pub location: String,
    /// Price per student in cents.
    pub price_cents: i64,
    /// `individual` or `group`.
    pub class_type: String,
    /// Capacity.
    pub max_students: i32,
    /// Number of enrolled students.
    pub enrolled: usize,
    /// `scheduled` or `cancelled`.
    pub status: String,
    /// Computed phase at the time of the request.
    pub phase: ClassPhase,
}

/// API response listing a coach's sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachClassesResponse {
    /// Sessions ordered by date and start time.
    pub classes: Vec<ClassInfo>,
}

/// API response listing sessions a student can book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableClassesResponse {
    /// Upcoming sessions with free capacity.
    pub classes: Vec<ClassInfo>,
}

// ============================================================================
// Attendance
// ============================================================================

/// One student's attendance in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttendanceEntry {
    /// The student.
    pub student_id: i64,
    /// `present`, `absent` or `late`.
    pub status: String,
}

/// API request to record attendance for a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitAttendanceRequest {
    /// The session.
    pub session_id: i64,
    /// One entry per student.
    pub records: Vec<AttendanceEntry>,
}

/// API response for a recorded attendance batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAttendanceResponse {
    /// The session.
    pub session_id: i64,
    /// Students whose record was written.
    pub student_ids: Vec<i64>,
    /// A success message.
    pub message: String,
}

/// API request naming one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SessionRequest {
    /// The session.
    pub session_id: i64,
}

/// API response with a student's own attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStatusResponse {
    /// The session.
    pub session_id: i64,
    /// The recorded status, if any.
    pub status: Option<AttendanceStatus>,
}

/// One student on an active session's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// The student.
    pub student_id: i64,
    /// Display name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Attendance recorded so far.
    pub attendance: Option<AttendanceStatus>,
}

/// API response with the roster of an active session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveClassStudentsResponse {
    /// The session.
    pub class: ClassInfo,
    /// Enrolled students in enrollment order.
    pub students: Vec<RosterEntry>,
}

// ============================================================================
// Bookings & payments
// ============================================================================

/// A student's booking with its session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingInfo {
    /// The booked session.
    pub class: ClassInfo,
    /// Payment state.
    pub payment_status: PaymentStatus,
}

/// API response for a new booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookClassResponse {
    /// The booking.
    pub booking: BookingInfo,
    /// A success message.
    pub message: String,
}

/// API response listing a student's bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentBookingsResponse {
    /// Bookings ordered by date and start time.
    pub bookings: Vec<BookingInfo>,
    /// Unpaid bookings released because their class starts soon.
    pub expired_session_ids: Vec<i64>,
}

/// API response with the next booked class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextClassResponse {
    /// The next upcoming booking, if any.
    pub next_class: Option<BookingInfo>,
}

/// API response for a cancelled booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelBookingResponse {
    /// The session.
    pub session_id: i64,
    /// Refund eligibility at cancellation time.
    pub refund: RefundQuote,
    /// Amount actually returned, in cents.
    pub refunded_cents: i64,
    /// Payment state of the booking when it was removed.
    pub payment_status: PaymentStatus,
    /// A success message.
    pub message: String,
}

/// A payment that passed validation and may be sent to the payment service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// The booked session.
    pub session_id: i64,
    /// The paying student.
    pub student_id: i64,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Statement description.
    pub description: String,
}

/// API response for a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayBookingResponse {
    /// The session.
    pub session_id: i64,
    /// New payment state.
    pub payment_status: PaymentStatus,
    /// The simulated transfer.
    pub transfer: TransferReceipt,
}

/// API response for a transfer status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferStatusResponse {
    /// The transfer reference.
    pub reference: String,
    /// Simulated status.
    pub status: crate::payments::TransferStatus,
}

// ============================================================================
// Feedback & notifications
// ============================================================================

/// API request to rate a finished class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitFeedbackRequest {
    /// The session.
    pub session_id: i64,
    /// Rating from 1 to 5.
    pub rating: i32,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// API response for stored feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitFeedbackResponse {
    /// The feedback identifier.
    pub feedback_id: i64,
    /// A success message.
    pub message: String,
}

/// Public view of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationInfo {
    /// The notification identifier.
    pub notification_id: i64,
    /// Short title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Whether the user has seen it.
    pub is_read: bool,
    /// Creation timestamp (RFC 3339, UTC).
    pub created_at: String,
}

/// API response listing notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsResponse {
    /// Newest first.
    pub notifications: Vec<NotificationInfo>,
    /// How many are unread.
    pub unread: usize,
}
