// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the coaching marketplace.
//!
//! This crate sits between the HTTP server and the domain and persistence
//! crates. It owns the request and response contract, authentication and
//! authorization, the password policy, and the handlers that enforce the
//! booking, attendance and feedback rules. It also holds the clients for
//! the two external collaborators, the mock payment service and the chat
//! provider.

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

mod auth;
mod chat;
mod error;
mod handlers;
mod password_policy;
mod payments;
mod request_response;
mod retry;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedUser, AuthenticationService, AuthorizationService, LoginOutcome};
pub use chat::{ChatError, ChatProvider, ChatSessions, LocalChatProvider};
pub use error::{ApiError, AuthError, translate_domain_error, translate_persistence_error};
pub use handlers::{
    active_class_students, attendance_status, book_class, cancel_booking, cancel_class,
    check_email, check_password, class_info, create_class, list_available_classes,
    list_coach_classes, list_notifications, list_student_bookings, login, logout,
    mark_notification_read, next_class, prepare_payment, record_payment, register_user,
    submit_attendance, submit_feedback, transfer_status, whoami,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError, PasswordRequirement};
pub use payments::{
    MockPaymentService, PendingPayment, PendingPayments, TransferReceipt, TransferStatus,
};
pub use request_response::{
    ActiveClassStudentsResponse, AttendanceEntry, AttendanceStatusResponse,
    AvailableClassesResponse, BookClassResponse, BookingInfo, CancelBookingResponse,
    CheckEmailRequest, CheckEmailResponse, CheckPasswordRequest, CheckPasswordResponse,
    ClassInfo, CoachClassesResponse, CreateClassRequest, LoginRequest, LoginResponse,
    NextClassResponse, NotificationInfo, NotificationsResponse, PayBookingResponse,
    PaymentIntent, RegisterRequest, RegisterResponse, RosterEntry, SessionRequest,
    StudentBookingsResponse, SubmitAttendanceRequest, SubmitAttendanceResponse,
    SubmitFeedbackRequest, SubmitFeedbackResponse, TransferStatusResponse, UserInfo,
};
pub use retry::{RetryPolicy, TransientError, retry_transient};
