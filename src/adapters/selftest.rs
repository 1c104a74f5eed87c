//! Diagnostic self-test adapter.
//!
//! Probes the two collaborators the machine cannot run without: storage
//! must round-trip a read, and the clock must report a plausible time.

use log::debug;

use crate::ports::{Clock, SelfTest, SelfTestReport, Storage};
use crate::session::Timestamp;

/// 2020-01-01T00:00:00Z. Anything earlier means the host clock never
/// synchronized.
const PLAUSIBLE_EPOCH: Timestamp = Timestamp(1_577_836_800);

pub struct BasicSelfTest<C, S> {
    clock: C,
    storage: S,
}

impl<C: Clock, S: Storage> BasicSelfTest<C, S> {
    pub fn new(clock: C, storage: S) -> Self {
        Self { clock, storage }
    }
}

impl<C: Clock, S: Storage> SelfTest for BasicSelfTest<C, S> {
    fn run(&mut self) -> SelfTestReport {
        // A readable store passes, including a store with no snapshot yet.
        let storage_ok = self.storage.load().is_ok();
        let clock_ok = self.clock.now() >= PLAUSIBLE_EPOCH;
        debug!("self-test probes: storage_ok={storage_ok} clock_ok={clock_ok}");
        SelfTestReport {
            storage_ok,
            clock_ok,
        }
    }
}
