// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use poachcoach_domain::{AttendanceStatus, PaymentStatus, UserRole};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub user_id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

/// A bearer-token session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSessionData {
    pub auth_session_id: i64,
    pub session_token: String,
    pub user_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// A student's enrollment in a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentData {
    pub enrollment_id: i64,
    pub session_id: i64,
    pub student_id: i64,
    pub payment_status: PaymentStatus,
    pub enrolled_at: String,
}

/// A recorded attendance mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceData {
    pub attendance_id: i64,
    pub session_id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub recorded_by: i64,
    pub recorded_at: String,
}

/// Post-class feedback from a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackData {
    pub feedback_id: i64,
    pub session_id: i64,
    pub student_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub submitted_at: String,
}

/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub notification_id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: String,
}
