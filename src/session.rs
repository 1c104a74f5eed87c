//! Production session tracking.
//!
//! A session is one contiguous counting interval, from `start` to `stop`.
//! The session is the unit that must be crash-consistent: its state is
//! captured as a [`SessionSnapshot`], persisted by the storage collaborator,
//! and restored on boot so an in-progress session survives an uncommanded
//! reset without double-counting or silent loss.
//!
//! The session never reads the clock itself — timestamps are passed in by
//! the dispatch step, which reads them fresh from the clock collaborator.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SnapshotError};

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Opaque wall-clock timestamp (seconds since the unix epoch), produced only
/// by the clock collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Seconds elapsed since `earlier`, clamped to 0 if the clock moved
    /// backwards. Never negative.
    pub fn secs_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Serializable capture of session state used for persistence and recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub active: bool,
    pub count: u16,
    pub cumulative_count: u32,
    pub started_at: Option<Timestamp>,
    pub stopped_at: Option<Timestamp>,
}

impl SessionSnapshot {
    /// Structural validation against the session invariants.
    ///
    /// `max_count` bounds the count field; an active session must carry a
    /// start time; a completed session with both timestamps must not have
    /// its stop precede its start.
    pub fn validate(&self, max_count: u16) -> Result<(), SnapshotError> {
        if self.count > max_count {
            return Err(SnapshotError::CountOutOfRange);
        }
        if self.active && self.started_at.is_none() {
            return Err(SnapshotError::ActiveWithoutStart);
        }
        if let (Some(start), Some(stop)) = (self.started_at, self.stopped_at) {
            if !self.active && stop < start {
                return Err(SnapshotError::InvertedTimestamps);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProductionSession
// ---------------------------------------------------------------------------

/// One counting session plus the cumulative total of completed sessions.
///
/// Created once at boot. Mutated exclusively by the dispatch step of the
/// control loop — interrupt handlers only push events; they never touch
/// session fields directly.
pub struct ProductionSession {
    active: bool,
    count: u16,
    cumulative_count: u32,
    started_at: Option<Timestamp>,
    stopped_at: Option<Timestamp>,
    /// Saturation bound for `count`.
    max_count: u16,
}

impl ProductionSession {
    pub fn new(max_count: u16) -> Self {
        Self {
            active: false,
            count: 0,
            cumulative_count: 0,
            started_at: None,
            stopped_at: None,
            max_count,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Begin a new session: count resets to 0 and the start time is
    /// recorded. Fails if a session is already running.
    pub fn start(&mut self, now: Timestamp) -> Result<(), SessionError> {
        if self.active {
            warn!("session start rejected: already active");
            return Err(SessionError::AlreadyActive);
        }
        self.active = true;
        self.count = 0;
        self.started_at = Some(now);
        self.stopped_at = None;
        info!("session started at t={}", now.0);
        Ok(())
    }

    /// End the running session: the stop time is recorded and the count is
    /// folded into the cumulative total. Fails if no session is running.
    pub fn stop(&mut self, now: Timestamp) -> Result<(), SessionError> {
        if !self.active {
            warn!("session stop rejected: not active");
            return Err(SessionError::NotActive);
        }
        self.active = false;
        self.stopped_at = Some(now);
        self.cumulative_count = self.cumulative_count.saturating_add(u32::from(self.count));
        info!(
            "session stopped at t={} count={} cumulative={}",
            now.0, self.count, self.cumulative_count
        );
        Ok(())
    }

    /// Count one item. No-op while inactive; saturates at the configured
    /// maximum (does not wrap, does not error).
    pub fn increment(&mut self) {
        if !self.active {
            return;
        }
        if self.count < self.max_count {
            self.count += 1;
        }
        // Periodic progress marker for long sessions.
        if self.count % 100 == 0 {
            info!("session count: {}", self.count);
        }
    }

    /// Session duration in seconds: `now - start` while active, otherwise
    /// `stop - start` for the last completed session. Clamped to 0 against
    /// non-monotonic clocks; 0 if no session has run.
    pub fn duration(&self, now: Timestamp) -> u64 {
        let Some(start) = self.started_at else {
            return 0;
        };
        if self.active {
            now.secs_since(start)
        } else {
            self.stopped_at.map_or(0, |stop| stop.secs_since(start))
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    pub fn cumulative_count(&self) -> u32 {
        self.cumulative_count
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<Timestamp> {
        self.stopped_at
    }

    // ── Persistence ───────────────────────────────────────────

    /// Capture the current state for the storage collaborator.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active: self.active,
            count: self.count,
            cumulative_count: self.cumulative_count,
            started_at: self.started_at,
            stopped_at: self.stopped_at,
        }
    }

    /// Adopt a persisted snapshot as the session's state (boot recovery).
    ///
    /// A structurally invalid snapshot is rejected with a typed error and
    /// the in-memory state is left untouched — recovery failures are
    /// signalled, never silently dropped.
    pub fn restore(&mut self, snap: &SessionSnapshot) -> Result<(), SnapshotError> {
        snap.validate(self.max_count)?;
        self.active = snap.active;
        self.count = snap.count;
        self.cumulative_count = snap.cumulative_count;
        self.started_at = snap.started_at;
        self.stopped_at = snap.stopped_at;
        if snap.active {
            info!(
                "recovered in-progress session: count={} cumulative={}",
                snap.count, snap.cumulative_count
            );
        }
        Ok(())
    }
}
