//! Interrupt-driven event system.
//!
//! Events are produced by:
//! - GPIO ISRs (item-detector pulses, latch button edges)
//! - Periodic monitors run by the mode tick (hour polling, init timeout)
//! - Software (boot completion, diagnostics, fault reporting)
//!
//! Events are consumed by the single control loop, which drains the queue
//! once per iteration and routes each event through the transition table.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GPIO ISR    │────▶│              │     │              │
//! │ Timer ISR   │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ Mode tick   │────▶│  (bounded)   │     │  (dispatch)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! `push` is safe to call from interrupt context: it performs one bounded
//! ring insertion inside a `critical_section` window and never allocates.
//! On overflow the **oldest** undelivered event is evicted and the drop is
//! counted — lossy under overload by policy, never a crash.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 32;

/// Discrete, payload-free system events.
///
/// All context needed to act on an event is read fresh from the session and
/// collaborators at dispatch time, so an event can never be stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// Item detector pulse (counts only while producing).
    ItemDetected = 0,
    /// Latch engaged — operator requested a production session.
    StartRequested = 1,
    /// Latch released — operator requested end of session.
    StopRequested = 2,
    /// Diagnostic button pressed.
    DiagnosticRequested = 3,
    /// Self-test suite finished.
    DiagnosticComplete = 4,
    /// Unrecoverable condition detected by a tick monitor or collaborator.
    FaultDetected = 5,
    /// Operator or supervisor commanded fault recovery.
    FaultCleared = 6,
    /// Startup finished; hardware collaborators are ready.
    InitComplete = 7,
    /// Wall-clock hour boundary crossed.
    HourBoundary = 8,
}

impl Event {
    /// Short name for structured logging.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ItemDetected => "item-detected",
            Self::StartRequested => "start-requested",
            Self::StopRequested => "stop-requested",
            Self::DiagnosticRequested => "diagnostic-requested",
            Self::DiagnosticComplete => "diagnostic-complete",
            Self::FaultDetected => "fault-detected",
            Self::FaultCleared => "fault-cleared",
            Self::InitComplete => "init-complete",
            Self::HourBoundary => "hour-boundary",
        }
    }
}

// ---------------------------------------------------------------------------
// Bounded FIFO
// ---------------------------------------------------------------------------

struct Inner {
    fifo: Deque<Event, EVENT_QUEUE_CAP>,
    dropped: u32,
}

/// Bounded FIFO of [`Event`]s shared between interrupt producers and the
/// single control-loop consumer.
///
/// Every operation takes `&self`, so producers hold plain shared references
/// (typically `&'static EventQueue`) while the state machine keeps the sole
/// consuming handle. Each operation is one short critical section — no
/// larger than the ring insertion itself.
pub struct EventQueue {
    inner: Mutex<RefCell<Inner>>,
}

impl EventQueue {
    /// Create an empty queue. `const` so it can live in a `static` for ISR
    /// access without runtime initialization.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                fifo: Deque::new(),
                dropped: 0,
            })),
        }
    }

    /// Enqueue an event. Never blocks, never allocates.
    ///
    /// Returns `false` when the queue was full: the oldest undelivered
    /// event is evicted to make room (counted via [`dropped`](Self::dropped)),
    /// and `event` is still enqueued.
    pub fn push(&self, event: Event) -> bool {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            let mut accepted_cleanly = true;
            if inner.fifo.is_full() {
                inner.fifo.pop_front();
                inner.dropped = inner.dropped.saturating_add(1);
                accepted_cleanly = false;
            }
            // Cannot fail: a slot was just guaranteed above.
            let _ = inner.fifo.push_back(event);
            accepted_cleanly
        })
    }

    /// Dequeue the next event in FIFO order, if any.
    pub fn pop(&self) -> Option<Event> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).fifo.pop_front())
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).fifo.len())
    }

    /// True if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total events evicted by the overflow policy since construction.
    pub fn dropped(&self) -> u32 {
        critical_section::with(|cs| self.inner.borrow_ref(cs).dropped)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
