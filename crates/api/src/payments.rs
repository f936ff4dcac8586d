// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mock bank-transfer service.
//!
//! This is a placeholder for a real payment processor. Transfers are not
//! stored anywhere, initiating the same payment twice creates two unrelated
//! references, and the status poll returns a random answer that nothing
//! reconciles against. A booking is marked paid as soon as a transfer is
//! initiated. Whoever integrates a real processor needs to add
//! idempotency keys, persist transfers and settle bookings from the
//! processor's final status instead.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

/// Status of a simulated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Submitted, not settled yet.
    Pending,
    /// Settled.
    Completed,
    /// Rejected by the bank.
    Failed,
}

impl TransferStatus {
    const ALL: [Self; 3] = [Self::Pending, Self::Completed, Self::Failed];

    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A simulated transfer as returned when it is initiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    /// Opaque transfer reference.
    pub reference: String,
    /// Always `pending` at initiation.
    pub status: TransferStatus,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Free-text description shown on the statement.
    pub description: String,
    /// Unix timestamp in milliseconds.
    pub created_at_ms: i64,
}

/// Fabricates transfer responses after an artificial delay.
#[derive(Debug, Clone, Copy)]
pub struct MockPaymentService {
    delay: Duration,
}

impl MockPaymentService {
    /// Creates a service that waits `delay` before answering an initiation.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Returns the artificial delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts a transfer.
    ///
    /// The reference is built from the current time plus a random suffix.
    pub async fn initiate_transfer(&self, amount_cents: i64, description: &str) -> TransferReceipt {
        let created_at_ms: i64 =
            i64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000)
                .unwrap_or(i64::MAX);
        let reference: String = format!(
            "TRF-{created_at_ms}-{:06}",
            rand::random_range(0..1_000_000_u32)
        );

        tokio::time::sleep(self.delay).await;

        info!(reference = %reference, amount_cents, "Mock transfer initiated");

        TransferReceipt {
            reference,
            status: TransferStatus::Pending,
            amount_cents,
            description: description.to_string(),
            created_at_ms,
        }
    }

    /// Polls a transfer. The answer is drawn uniformly at random and does
    /// not depend on the reference.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn check_transfer_status(&self, reference: &str) -> TransferStatus {
        let index: usize = rand::random_range(0..TransferStatus::ALL.len());
        let status: TransferStatus = TransferStatus::ALL[index];
        info!(reference = %reference, status = %status, "Mock transfer polled");
        status
    }
}

/// Bookings whose transfer is currently running.
///
/// The database lock is released while a transfer runs, so a second
/// payment for the same booking has to be turned away here.
#[derive(Debug, Clone, Default)]
pub struct PendingPayments {
    bookings: Arc<Mutex<HashSet<(i64, i64)>>>,
}

impl PendingPayments {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a booking for one transfer. Returns `None` if another
    /// transfer for it is already running.
    #[must_use]
    pub fn claim(&self, session_id: i64, student_id: i64) -> Option<PendingPayment> {
        let key: (i64, i64) = (session_id, student_id);
        let inserted: bool = self
            .bookings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
        inserted.then(|| PendingPayment {
            bookings: Arc::clone(&self.bookings),
            key,
        })
    }

    /// Returns whether a transfer for the booking is running.
    #[must_use]
    pub fn contains(&self, session_id: i64, student_id: i64) -> bool {
        self.bookings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(session_id, student_id))
    }
}

/// A claimed booking. Dropping it releases the claim.
#[derive(Debug)]
pub struct PendingPayment {
    bookings: Arc<Mutex<HashSet<(i64, i64)>>>,
    key: (i64, i64),
}

impl Drop for PendingPayment {
    fn drop(&mut self) {
        self.bookings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
