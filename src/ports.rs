//! Port traits — the boundary between the supervisory core and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ StateMachine / Supervisor (core)
//! ```
//!
//! Adapters (real clock, file-backed storage, display, latch hardware)
//! implement these traits. The core consumes them via generics, so it never
//! touches hardware directly and every test can substitute mocks.
//!
//! Contract notes:
//!
//! - All calls made from the dispatch step must be non-blocking or
//!   bounded-latency; a collaborator that cannot complete synchronously must
//!   expose a fire-and-check-later interface rather than stall the loop.
//! - Collaborators receive read-only snapshots or one-shot commands, never
//!   long-lived references into core state.

use crate::error::IoError;
use crate::session::{SessionSnapshot, Timestamp};

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Wall-clock source. The core polls `hour_of(now())` against a last-seen
/// value to detect hour boundaries.
pub trait Clock {
    fn now(&self) -> Timestamp;

    /// Hour-of-day (0–23) for a timestamp.
    fn hour_of(&self, t: Timestamp) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Storage
// ───────────────────────────────────────────────────────────────

/// Session persistence. Called by the core only at explicit transition
/// points (entering Diagnostic/Fault from Producing, boot recovery); the
/// supervisor additionally snapshots on its own autosave schedule.
/// Failures are logged by the caller and never block a transition.
pub trait Storage {
    /// Durably record a session snapshot. Must be atomic — a power cut
    /// mid-write yields either the old snapshot or the new one, never a
    /// torn blob.
    fn persist(&mut self, snap: &SessionSnapshot) -> Result<(), IoError>;

    /// Load the last persisted snapshot. `Ok(None)` on first boot.
    fn load(&mut self) -> Result<Option<SessionSnapshot>, IoError>;
}

// ───────────────────────────────────────────────────────────────
// Presentation
// ───────────────────────────────────────────────────────────────

/// Reasons a requested transition was consumed without effect. Surfaced to
/// the operator as a warning, never escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// `can_start_production` guard returned false.
    StartNotPermitted,
    /// `can_stop_production` guard returned false.
    StopNotPermitted,
}

impl core::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StartNotPermitted => write!(f, "production start not permitted"),
            Self::StopNotPermitted => write!(f, "production stop not permitted"),
        }
    }
}

/// One-way, fire-and-forget notifications toward the operator display.
/// The core never consumes a return value from these.
pub trait Presentation {
    /// The machine entered Ready.
    fn on_enter_ready(&mut self);

    /// Periodic refresh while producing, with the live count.
    fn on_producing_tick(&mut self, count: u16);

    /// A requested transition was rejected by a guard.
    fn on_rejected(&mut self, reason: RejectReason);

    /// The machine entered Fault.
    fn on_fault(&mut self, message: &str);

    /// An hour boundary was processed (housekeeping).
    fn on_hour_logged(&mut self, hour: u8);

    /// The diagnostic self-test finished.
    fn on_self_test(&mut self, report: &SelfTestReport);
}

// ───────────────────────────────────────────────────────────────
// Guard inputs
// ───────────────────────────────────────────────────────────────

/// Externally supplied transition preconditions (e.g. a physical latch
/// signal), queried synchronously at dispatch time.
pub trait Guards {
    fn can_start_production(&self) -> bool;
    fn can_stop_production(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Diagnostics
// ───────────────────────────────────────────────────────────────

/// Outcome of the diagnostic self-test suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTestReport {
    pub storage_ok: bool,
    pub clock_ok: bool,
}

impl SelfTestReport {
    pub fn all_ok(&self) -> bool {
        self.storage_ok && self.clock_ok
    }
}

/// Diagnostic collaborator: runs the hardware self-test suite. Expected to
/// complete within a bounded time; the outcome is reported through
/// [`Presentation::on_self_test`].
pub trait SelfTest {
    fn run(&mut self) -> SelfTestReport;
}
