// Copyright (C) 2026 PoachCoach contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Edge detection over observed class phases.
//!
//! A tracker remembers the last phase it saw for each session and reports
//! only the changes, so a periodic monitor can announce each start and end
//! once, independent of how often it polls.

use crate::lifecycle::ClassPhase;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A lifecycle edge worth announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleTransition {
    /// The class became active.
    ClassStarted {
        /// The session that started.
        session_id: i64,
    },
    /// The class ended after having been seen before its end.
    ClassEnded {
        /// The session that ended.
        session_id: i64,
    },
}

impl LifecycleTransition {
    /// Returns the session the transition belongs to.
    #[must_use]
    pub const fn session_id(&self) -> i64 {
        match self {
            Self::ClassStarted { session_id } | Self::ClassEnded { session_id } => *session_id,
        }
    }
}

/// Remembers the last observed phase per session.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    phases: HashMap<i64, ClassPhase>,
}

impl PhaseTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a phase for a session and returns the edge it crossed, if any.
    ///
    /// A session first seen while active yields `ClassStarted`. A session
    /// first seen after it ended yields nothing, so a restart does not
    /// replay old endings.
    pub fn observe(&mut self, session_id: i64, phase: ClassPhase) -> Option<LifecycleTransition> {
        let previous: Option<ClassPhase> = self.phases.insert(session_id, phase);

        match (previous, phase) {
            (Some(ClassPhase::Active), ClassPhase::Active) => None,
            (_, ClassPhase::Active) => Some(LifecycleTransition::ClassStarted { session_id }),
            (Some(ClassPhase::Upcoming | ClassPhase::Active), ClassPhase::Ended) => {
                Some(LifecycleTransition::ClassEnded { session_id })
            }
            _ => None,
        }
    }

    /// Forgets every session not in `observed`.
    pub fn retain_observed(&mut self, observed: &HashSet<i64>) {
        self.phases.retain(|id, _| observed.contains(id));
    }

    /// Returns the last phase recorded for a session.
    #[must_use]
    pub fn phase_of(&self, session_id: i64) -> Option<ClassPhase> {
        self.phases.get(&session_id).copied()
    }

    /// Returns the number of sessions being tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Returns whether no sessions are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}
