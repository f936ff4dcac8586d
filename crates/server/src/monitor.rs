// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Background detection of class starts and ends.
//!
//! The monitor wakes on a fixed interval, classifies every scheduled class
//! dated yesterday through tomorrow (UTC), and broadcasts each start and end
//! once. The tracker lives in memory, so a restart may announce a running
//! class a second time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use poachcoach_domain::{
    ClassPhase, CoachingSession, LifecycleTransition, PhaseTracker, classify, format_date,
};
use poachcoach_persistence::Persistence;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::live::{LiveEvent, LiveEventBroadcaster};

/// Periodic class lifecycle monitor.
pub struct ClassMonitor {
    persistence: Arc<Mutex<Persistence>>,
    live: LiveEventBroadcaster,
    interval: StdDuration,
    tracker: PhaseTracker,
}

/// The UTC dates whose classes can be running at `now` in some timezone.
fn candidate_dates(now: OffsetDateTime) -> Vec<String> {
    [-1, 0, 1]
        .into_iter()
        .map(|offset| format_date((now + Duration::days(offset)).date()))
        .collect()
}

impl ClassMonitor {
    /// Creates a monitor with an empty tracker.
    #[must_use]
    pub fn new(
        persistence: Arc<Mutex<Persistence>>,
        live: LiveEventBroadcaster,
        interval: StdDuration,
    ) -> Self {
        Self {
            persistence,
            live,
            interval,
            tracker: PhaseTracker::new(),
        }
    }

    /// Runs one detection pass and broadcasts the transitions it found.
    ///
    /// Storage failures are logged and yield no transitions; the next tick
    /// tries again.
    pub async fn tick(&mut self, now: OffsetDateTime) -> Vec<LifecycleTransition> {
        let dates: Vec<String> = candidate_dates(now);
        let mut persistence = self.persistence.lock().await;
        let loaded = persistence.list_scheduled_sessions_on_dates(&dates);
        drop(persistence);

        let sessions: Vec<CoachingSession> = match loaded {
            Ok(sessions) => sessions,
            Err(err) => {
                error!(error = %err, "Class monitor failed to load sessions");
                return Vec::new();
            }
        };

        let mut observed: HashSet<i64> = HashSet::with_capacity(sessions.len());
        let mut transitions: Vec<LifecycleTransition> = Vec::new();

        for session in &sessions {
            let Some(session_id) = session.session_id else {
                continue;
            };
            let phase: ClassPhase = match classify(session, now) {
                Ok(phase) => phase,
                Err(err) => {
                    warn!(session_id, error = %err, "Skipping class with invalid schedule");
                    continue;
                }
            };
            observed.insert(session_id);

            if let Some(transition) = self.tracker.observe(session_id, phase) {
                info!(?transition, "Class lifecycle transition");
                self.live.broadcast(LiveEvent::from(transition));
                transitions.push(transition);
            }
        }

        self.tracker.retain_observed(&observed);
        debug!(
            tracked = self.tracker.len(),
            transitions = transitions.len(),
            "Class monitor tick"
        );

        transitions
    }

    /// Ticks forever on the configured interval.
    pub async fn run(mut self) {
        let mut ticker: tokio::time::Interval = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval = ?self.interval, "Class monitor started");
        loop {
            ticker.tick().await;
            self.tick(OffsetDateTime::now_utc()).await;
        }
    }

    /// Spawns [`Self::run`] on the runtime.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
