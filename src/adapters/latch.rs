//! Guard adapter backed by an operator enable latch.
//!
//! Two atomics shared with whatever owns the physical controls: an enable
//! latch (key switch, lockout tag) and an availability flag for the
//! surrounding machinery. Production may start only when both are set;
//! stopping is always permitted so an operator can never be locked into a
//! running line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ports::Guards;

#[derive(Default)]
pub struct LatchState {
    enabled: AtomicBool,
    available: AtomicBool,
}

impl LatchState {
    pub fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::Release);
    }

    pub fn set_available(&self, on: bool) {
        self.available.store(on, Ordering::Release);
    }
}

pub struct LatchGuards {
    state: Arc<LatchState>,
}

impl LatchGuards {
    /// Build the guard and the shared handle the control owner flips.
    pub fn new() -> (Self, Arc<LatchState>) {
        let state = Arc::new(LatchState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl Guards for LatchGuards {
    fn can_start_production(&self) -> bool {
        self.state.enabled.load(Ordering::Acquire) && self.state.available.load(Ordering::Acquire)
    }

    fn can_stop_production(&self) -> bool {
        true
    }
}
