//! Boot recovery and the periodic autosave policy.
//!
//! The [`StateMachine`] persists the session at the explicit transition
//! points (leaving Producing for Diagnostic or Fault). The supervisor adds
//! the two pieces that live outside dispatch: restoring a snapshot from
//! storage at boot, and periodically saving a live session so an abrupt
//! power loss costs at most one save interval of counting.

use log::{info, warn};

use crate::events::Event;
use crate::fsm::{Mode, StateMachine};
use crate::ports::{Clock, Guards, Presentation, SelfTest, Storage};
use crate::session::Timestamp;

/// Outcome of the boot recovery pass, surfaced for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// No snapshot on storage; cold boot.
    Fresh,
    /// A snapshot was loaded and adopted.
    Restored,
    /// Storage returned an error or the snapshot failed validation; the
    /// machine starts fresh and runs with degraded durability.
    Degraded,
}

/// Drives the [`StateMachine`] through boot and the steady-state loop.
pub struct Supervisor<'q> {
    machine: StateMachine<'q>,
    /// Timestamp of the last successful autosave, if any.
    last_save: Option<Timestamp>,
    /// Cumulative count at the last autosave, to skip no-change writes.
    last_saved_count: Option<u16>,
}

impl<'q> Supervisor<'q> {
    pub fn new(machine: StateMachine<'q>) -> Self {
        Self {
            machine,
            last_save: None,
            last_saved_count: None,
        }
    }

    pub fn machine(&self) -> &StateMachine<'q> {
        &self.machine
    }

    /// Run boot recovery: load a snapshot if one exists, validate it,
    /// adopt it, then raise `InitComplete`. Recovery problems never stop
    /// the boot; they cost durability, not operation.
    pub fn boot<S: Storage>(&mut self, storage: &mut S) -> Recovery {
        let mut resume = false;
        let recovery = match storage.load() {
            Ok(None) => {
                info!("boot: no prior session snapshot, starting fresh");
                Recovery::Fresh
            }
            Ok(Some(snap)) => match self.machine.restore_session(&snap) {
                Ok(()) => {
                    if snap.active {
                        info!(
                            "boot: recovered interrupted session, count={} cumulative={}",
                            snap.count, snap.cumulative_count
                        );
                        resume = true;
                    } else {
                        info!(
                            "boot: recovered completed session state, cumulative={}",
                            snap.cumulative_count
                        );
                    }
                    Recovery::Restored
                }
                Err(e) => {
                    warn!("boot: snapshot rejected ({e}), starting fresh");
                    Recovery::Degraded
                }
            },
            Err(e) => {
                warn!("boot: snapshot load failed ({e}), starting fresh");
                Recovery::Degraded
            }
        };

        self.machine.events().push(Event::InitComplete);
        if resume {
            // Queued behind InitComplete so the machine is in Ready when
            // the resume request arrives; entering Producing picks the
            // recovered session up where it left off.
            self.machine.events().push(Event::StartRequested);
        }
        recovery
    }

    /// One steady-state iteration: step the machine, then apply the
    /// autosave policy.
    pub fn poll<C, S, P, G, D>(
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
        let was_producing = self.machine.mode() == Mode::Producing;
        self.machine.step(clock, storage, present, guards, self_test);
        self.autosave(was_producing, clock, storage);
    }

    /// Persist a live session at most once per save interval, and once
    /// more immediately after a clean stop so the inactive record lands
    /// on storage.
    fn autosave<C: Clock, S: Storage>(&mut self, was_producing: bool, clock: &C, storage: &mut S) {
        let now = clock.now();
        match self.machine.mode() {
            Mode::Producing => {
                if !self.interval_elapsed(now) {
                    return;
                }
                let snap = self.machine.session_snapshot();
                if self.last_saved_count == Some(snap.count) {
                    return;
                }
                match storage.persist(&snap) {
                    Ok(()) => {
                        self.last_save = Some(now);
                        self.last_saved_count = Some(snap.count);
                    }
                    Err(e) => warn!("autosave failed: {e}"),
                }
            }
            Mode::Ready if was_producing => {
                // Clean stop this iteration: record the final inactive state.
                let snap = self.machine.session_snapshot();
                match storage.persist(&snap) {
                    Ok(()) => {
                        self.last_save = Some(now);
                        self.last_saved_count = None;
                    }
                    Err(e) => warn!("post-stop save failed: {e}"),
                }
            }
            _ => {}
        }
    }

    fn interval_elapsed(&self, now: Timestamp) -> bool {
        let Some(last) = self.last_save else {
            return true;
        };
        let interval_secs = u64::from(self.machine.config().save_interval_ms).div_ceil(1000);
        now.secs_since(last) >= interval_secs
    }
}
