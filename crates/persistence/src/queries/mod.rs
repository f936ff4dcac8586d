// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! - `users`: users and auth sessions
//! - `classes`: coaching sessions and enrollments
//! - `attendance`: attendance records and feedback
//! - `notifications`: in-app notifications
//!
//! Every query exists as a `_sqlite` and a `_mysql` function; the
//! `Persistence` adapter in `lib.rs` picks one per call.

pub mod attendance;
pub mod classes;
pub mod notifications;
pub mod users;

