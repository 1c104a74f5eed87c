//! Table-driven finite state machine engine.
//!
//! Classic embedded FSM pattern: a static transition table maps
//! `(mode, event)` to an optional guard, a side-effect action, and a
//! destination mode. Each control-loop iteration the engine runs the
//! current mode's tick behavior (monitor-only — it may enqueue events but
//! never changes the mode), then drains the event queue and routes every
//! event through the table.
//!
//! Single-writer discipline: `Mode` and the [`ProductionSession`] are
//! mutated exclusively inside [`StateMachine::dispatch_event`]. Interrupt
//! handlers only ever call [`EventQueue::push`]. A tick or action that
//! detects an unrecoverable inconsistency enqueues
//! [`Event::FaultDetected`] instead of touching the mode itself.

pub mod table;

use log::{info, warn};

use crate::config::SystemConfig;
use crate::events::{Event, EventQueue};
use crate::ports::{Clock, Guards, Presentation, RejectReason, SelfTest, Storage};
use crate::session::{ProductionSession, SessionSnapshot};
use table::{ActionKind, GuardKind, Transition};

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Operating mode of the device. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    Initializing = 0,
    Ready = 1,
    Producing = 2,
    Diagnostic = 3,
    Fault = 4,
}

impl Mode {
    /// Display name for structured logging.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::Ready => "READY",
            Self::Producing => "PRODUCING",
            Self::Diagnostic => "DIAGNOSTIC",
            Self::Fault => "FAULT",
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch outcome
// ---------------------------------------------------------------------------

/// What happened when one event went through the table. Returned so the
/// supervisor and tests can observe dispatch results without parsing logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A row fired and the mode changed.
    Transitioned { from: Mode, to: Mode },
    /// A row fired without a mode change (self-transition).
    Handled,
    /// No row for this `(mode, event)` pair — consumed silently.
    Ignored,
    /// A guard predicate was false — consumed, surfaced to presentation.
    GuardRejected,
    /// The row's action returned a typed failure — no transition occurred.
    ActionFailed,
}

/// Running counters maintained by the engine, exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineStats {
    pub events_dispatched: u32,
    pub transitions: u32,
    pub guard_rejections: u32,
    pub actions_failed: u32,
}

// ---------------------------------------------------------------------------
// StateMachine
// ---------------------------------------------------------------------------

/// The supervisory state machine.
///
/// Owns the current [`Mode`], the [`ProductionSession`], and the consuming
/// end of the [`EventQueue`]. Constructed once at process start and handed
/// to every component that needs to query mode — no ambient global lookup,
/// so tests get a fresh instance each.
pub struct StateMachine<'q> {
    mode: Mode,
    queue: &'q EventQueue,
    session: ProductionSession,
    config: SystemConfig,

    /// Monotonic tick counter (wraps at `u64::MAX`).
    total_ticks: u64,
    /// Ticks since the current mode was entered.
    ticks_in_mode: u64,

    // -- Tick monitors --
    /// Last wall-clock hour observed by the boundary poll.
    last_seen_hour: Option<u8>,
    /// Init timeout reported once per Initializing episode.
    init_timeout_reported: bool,
    /// Stall monitor: count at the last change, ticks since it moved.
    stall_ref_count: u16,
    stall_ticks: u64,
    stall_warned: bool,
    /// Diagnostic self-test runs once per Diagnostic episode.
    self_test_done: bool,

    stats: MachineStats,
}

impl<'q> StateMachine<'q> {
    /// Construct the machine in `Initializing`, consuming from `queue`.
    pub fn new(queue: &'q EventQueue, config: SystemConfig) -> Self {
        let session = ProductionSession::new(config.max_count);
        Self {
            mode: Mode::Initializing,
            queue,
            session,
            config,
            total_ticks: 0,
            ticks_in_mode: 0,
            last_seen_hour: None,
            init_timeout_reported: false,
            stall_ref_count: 0,
            stall_ticks: 0,
            stall_warned: false,
            self_test_done: false,
            stats: MachineStats::default(),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn session(&self) -> &ProductionSession {
        &self.session
    }

    /// The event queue this machine drains. Producers (ISRs, monitors)
    /// share this reference; only the machine consumes from it.
    pub fn events(&self) -> &'q EventQueue {
        self.queue
    }

    pub fn stats(&self) -> MachineStats {
        self.stats
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn ticks_in_current_mode(&self) -> u64 {
        self.ticks_in_mode
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Capture the session for persistence.
    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Adopt a recovered snapshot (boot only, before the first step).
    pub fn restore_session(
        &mut self,
        snap: &SessionSnapshot,
    ) -> Result<(), crate::error::SnapshotError> {
        self.session.restore(snap)
    }

    // ── Control-loop iteration ────────────────────────────────

    /// Run one full iteration: mode tick, then drain + dispatch.
    ///
    /// Only the events queued when the drain begins are dispatched this
    /// iteration; anything an action enqueues is seen next time, so
    /// dispatch can never recurse on its own output.
    pub fn step<C, S, P, G, D>(
        &mut self,
        clock: &C,
        storage: &mut S,
        present: &mut P,
        guards: &G,
        self_test: &mut D,
    ) where
        C: Clock,
        S: Storage,
        P: Presentation,
        G: Guards,
        D: SelfTest,
    {
        self.total_ticks = self.total_ticks.wrapping_add(1);
        self.ticks_in_mode = self.ticks_in_mode.wrapping_add(1);

        self.tick(clock, present, self_test);

        let pending = self.queue.len();
        for _ in 0..pending {
            let Some(event) = self.queue.pop() else { break };
            self.dispatch_event(event, clock, storage, present, guards);
        }
    }

    // ── Tick behavior (monitor-only, per mode) ────────────────

    /// Per-iteration, idempotent monitoring for the current mode. Never
    /// mutates the mode — it may only enqueue events for dispatch.
    fn tick<C, P, D>(&mut self, clock: &C, present: &mut P, self_test: &mut D)
    where
        C: Clock,
        P: Presentation,
        D: SelfTest,
    {
        match self.mode {
            Mode::Initializing => {
                let timeout_ticks =
                    u64::from(self.config.init_timeout_secs) * self.config.ticks_per_sec();
                if !self.init_timeout_reported && self.ticks_in_mode >= timeout_ticks {
                    warn!(
                        "initialization did not complete within {}s",
                        self.config.init_timeout_secs
                    );
                    self.init_timeout_reported = true;
                    self.queue.push(Event::FaultDetected);
                }
            }
            Mode::Ready => {
                self.poll_hour_boundary(clock);
            }
            Mode::Producing => {
                self.poll_hour_boundary(clock);
                self.monitor_stall();
                present.on_producing_tick(self.session.count());
            }
            Mode::Diagnostic => {
                if !self.self_test_done {
                    self.self_test_done = true;
                    let report = self_test.run();
                    present.on_self_test(&report);
                    if report.all_ok() {
                        self.queue.push(Event::DiagnosticComplete);
                    } else {
                        warn!(
                            "self-test failed: storage_ok={} clock_ok={}",
                            report.storage_ok, report.clock_ok
                        );
                        self.queue.push(Event::FaultDetected);
                    }
                }
            }
            Mode::Fault => {
                // Terminal: nothing to monitor until fault-cleared arrives.
            }
        }
    }

    /// Compare the wall-clock hour against the last-seen value and raise
    /// `HourBoundary` on a change.
    fn poll_hour_boundary<C: Clock>(&mut self, clock: &C) {
        let hour = clock.hour_of(clock.now());
        match self.last_seen_hour {
            Some(prev) if prev == hour => {}
            Some(_) => {
                self.last_seen_hour = Some(hour);
                self.queue.push(Event::HourBoundary);
            }
            None => self.last_seen_hour = Some(hour),
        }
    }

    /// Warn once when the count has not moved for the configured window.
    fn monitor_stall(&mut self) {
        if !self.session.is_active() {
            return;
        }
        if self.session.count() != self.stall_ref_count {
            self.stall_ref_count = self.session.count();
            self.stall_ticks = 0;
            self.stall_warned = false;
            return;
        }
        self.stall_ticks = self.stall_ticks.saturating_add(1);
        let warn_ticks = u64::from(self.config.stall_warn_secs) * self.config.ticks_per_sec();
        if !self.stall_warned && self.stall_ticks >= warn_ticks {
            self.stall_warned = true;
            warn!(
                "production stalled: count {} unchanged for {}s",
                self.stall_ref_count, self.config.stall_warn_secs
            );
        }
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Route one event through the transition table. The single place the
    /// mode is written, and the single structured-log point for
    /// `(mode, event, outcome)`.
    pub fn dispatch_event<C, S, P, G>(
        &mut self,
        event: Event,
        clock: &C,
        storage: &mut S,
        present: &mut P,
        guards: &G,
    ) -> DispatchOutcome
    where
        C: Clock,
        S: Storage,
        P: Presentation,
        G: Guards,
    {
        self.stats.events_dispatched = self.stats.events_dispatched.wrapping_add(1);
        let mode = self.mode;

        let outcome = match table::lookup(mode, event) {
            None => DispatchOutcome::Ignored,
            Some(t) => match t.guard {
                Some(kind) if !self.guard_holds(kind, guards) => {
                    self.stats.guard_rejections = self.stats.guard_rejections.wrapping_add(1);
                    present.on_rejected(reject_reason(kind));
                    DispatchOutcome::GuardRejected
                }
                _ => self.fire(t, clock, storage, present),
            },
        };

        info!(
            "dispatch: mode={} event={} outcome={:?}",
            mode.name(),
            event.name(),
            outcome
        );
        outcome
    }

    fn guard_holds<G: Guards>(&self, kind: GuardKind, guards: &G) -> bool {
        match kind {
            GuardKind::CanStartProduction => guards.can_start_production(),
            GuardKind::CanStopProduction => guards.can_stop_production(),
        }
    }

    /// Execute a row: action first, then the mode update. A typed action
    /// failure consumes the event without transitioning.
    fn fire<C, S, P>(
        &mut self,
        t: &Transition,
        clock: &C,
        storage: &mut S,
        present: &mut P,
    ) -> DispatchOutcome
    where
        C: Clock,
        S: Storage,
        P: Presentation,
    {
        match t.action {
            ActionKind::None => {}
            ActionKind::StartSession => {
                // An active session here can only be one recovered at boot;
                // entering Producing resumes it instead of resetting it.
                if self.session.is_active() {
                    info!(
                        "resuming in-progress session, count={}",
                        self.session.count()
                    );
                } else if let Err(e) = self.session.start(clock.now()) {
                    warn!("start action failed: {e}");
                    self.stats.actions_failed = self.stats.actions_failed.wrapping_add(1);
                    return DispatchOutcome::ActionFailed;
                }
            }
            ActionKind::StopSession => {
                if let Err(e) = self.session.stop(clock.now()) {
                    warn!("stop action failed: {e}");
                    self.stats.actions_failed = self.stats.actions_failed.wrapping_add(1);
                    return DispatchOutcome::ActionFailed;
                }
            }
            ActionKind::StopSessionBestEffort => {
                if let Err(e) = self.session.stop(clock.now()) {
                    info!("best-effort stop in fault: {e}");
                }
            }
            ActionKind::IncrementCount => {
                self.session.increment();
            }
            ActionKind::PersistSession => {
                // Failure degrades durability only; the transition proceeds.
                if let Err(e) = storage.persist(&self.session.snapshot()) {
                    warn!("session persist failed: {e}");
                }
            }
            ActionKind::Housekeeping => {
                let hour = clock.hour_of(clock.now());
                info!("hour boundary housekeeping: hour={hour}");
                present.on_hour_logged(hour);
            }
        }

        if t.to == self.mode {
            return DispatchOutcome::Handled;
        }

        let from = self.mode;
        self.mode = t.to;
        self.ticks_in_mode = 0;
        self.stats.transitions = self.stats.transitions.wrapping_add(1);
        self.enter_mode(t.to, present);
        info!("transition: {} -> {}", from.name(), t.to.name());
        DispatchOutcome::Transitioned { from, to: t.to }
    }

    /// Per-mode entry bookkeeping and presentation notifications.
    fn enter_mode<P: Presentation>(&mut self, mode: Mode, present: &mut P) {
        match mode {
            Mode::Initializing => {
                self.init_timeout_reported = false;
            }
            Mode::Ready => {
                present.on_enter_ready();
            }
            Mode::Producing => {
                self.stall_ref_count = self.session.count();
                self.stall_ticks = 0;
                self.stall_warned = false;
            }
            Mode::Diagnostic => {
                self.self_test_done = false;
            }
            Mode::Fault => {
                present.on_fault("fault detected: operator attention required");
            }
        }
    }
}

fn reject_reason(kind: GuardKind) -> RejectReason {
    match kind {
        GuardKind::CanStartProduction => RejectReason::StartNotPermitted,
        GuardKind::CanStopProduction => RejectReason::StopNotPermitted,
    }
}
