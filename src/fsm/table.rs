//! The static transition table.
//!
//! One row per `(mode, event)` pair the machine reacts to — plain data in a
//! fixed array, no heap, no `dyn`. Pairs absent from the table mean "event
//! is ignored in this mode", which is not an error. Guards and actions are
//! discriminants interpreted by the engine at dispatch time, keeping the
//! table the single source of truth for what can happen.
//!
//! ```text
//!  INITIALIZING ──[init-complete]──▶ READY ──[start-requested]──▶ PRODUCING
//!                                     ▲  │                          │
//!                                     │  └─[diagnostic-requested]   │
//!                                     │              ▼              │
//!                                     └──────── DIAGNOSTIC          │
//!                                                                   │
//!  Any mode ──[fault-detected]──▶ FAULT ──[fault-cleared]──▶ READY ◀┘
//! ```

use super::Mode;
use crate::events::Event;

/// Guard predicate selector, resolved against the [`Guards`](crate::ports::Guards)
/// collaborator at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    CanStartProduction,
    CanStopProduction,
}

/// Side effect executed when a row fires, before the mode is updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// No side effect.
    None,
    /// `ProductionSession::start` with a fresh clock reading.
    StartSession,
    /// `ProductionSession::stop` with a fresh clock reading.
    StopSession,
    /// Best-effort `stop` — failure is logged, never blocks.
    StopSessionBestEffort,
    /// `ProductionSession::increment`.
    IncrementCount,
    /// Persist a session snapshot before leaving Producing.
    PersistSession,
    /// Hour-boundary housekeeping (log + presentation).
    Housekeeping,
}

/// One row of the table.
pub struct Transition {
    pub from: Mode,
    pub on: Event,
    pub guard: Option<GuardKind>,
    pub action: ActionKind,
    pub to: Mode,
}

/// The full transition table. Row order is irrelevant; `(from, on)` pairs
/// are unique.
pub static TRANSITIONS: &[Transition] = &[
    // ── Initializing ──────────────────────────────────────────
    Transition {
        from: Mode::Initializing,
        on: Event::InitComplete,
        guard: None,
        action: ActionKind::None,
        to: Mode::Ready,
    },
    Transition {
        from: Mode::Initializing,
        on: Event::FaultDetected,
        guard: None,
        action: ActionKind::None,
        to: Mode::Fault,
    },
    // ── Ready ─────────────────────────────────────────────────
    Transition {
        from: Mode::Ready,
        on: Event::StartRequested,
        guard: Some(GuardKind::CanStartProduction),
        action: ActionKind::StartSession,
        to: Mode::Producing,
    },
    Transition {
        from: Mode::Ready,
        on: Event::DiagnosticRequested,
        guard: None,
        action: ActionKind::None,
        to: Mode::Diagnostic,
    },
    Transition {
        from: Mode::Ready,
        on: Event::FaultDetected,
        guard: None,
        action: ActionKind::None,
        to: Mode::Fault,
    },
    Transition {
        from: Mode::Ready,
        on: Event::HourBoundary,
        guard: None,
        action: ActionKind::Housekeeping,
        to: Mode::Ready,
    },
    // ── Producing ─────────────────────────────────────────────
    Transition {
        from: Mode::Producing,
        on: Event::StopRequested,
        guard: Some(GuardKind::CanStopProduction),
        action: ActionKind::StopSession,
        to: Mode::Ready,
    },
    Transition {
        from: Mode::Producing,
        on: Event::ItemDetected,
        guard: None,
        action: ActionKind::IncrementCount,
        to: Mode::Producing,
    },
    Transition {
        from: Mode::Producing,
        on: Event::HourBoundary,
        guard: None,
        action: ActionKind::Housekeeping,
        to: Mode::Producing,
    },
    Transition {
        from: Mode::Producing,
        on: Event::DiagnosticRequested,
        guard: None,
        action: ActionKind::PersistSession,
        to: Mode::Diagnostic,
    },
    Transition {
        from: Mode::Producing,
        on: Event::FaultDetected,
        guard: None,
        action: ActionKind::PersistSession,
        to: Mode::Fault,
    },
    // ── Diagnostic ────────────────────────────────────────────
    Transition {
        from: Mode::Diagnostic,
        on: Event::DiagnosticComplete,
        guard: None,
        action: ActionKind::None,
        to: Mode::Ready,
    },
    Transition {
        from: Mode::Diagnostic,
        on: Event::FaultDetected,
        guard: None,
        action: ActionKind::None,
        to: Mode::Fault,
    },
    // ── Fault (terminal until explicitly cleared) ─────────────
    Transition {
        from: Mode::Fault,
        on: Event::FaultCleared,
        guard: None,
        action: ActionKind::None,
        to: Mode::Ready,
    },
    Transition {
        from: Mode::Fault,
        on: Event::StopRequested,
        guard: None,
        action: ActionKind::StopSessionBestEffort,
        to: Mode::Fault,
    },
];

/// Find the row for `(mode, event)`, if the table reacts to it.
pub fn lookup(mode: Mode, event: Event) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == mode && t.on == event)
}
