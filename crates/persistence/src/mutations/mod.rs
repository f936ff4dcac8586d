// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! All mutations use Diesel DSL. The only backend-specific helper they
//! need is `last_insert_id()`, reached through the
//! `PersistenceBackend` trait.

pub mod attendance;
pub mod classes;
pub mod notifications;
pub mod users;
