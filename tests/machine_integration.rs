//! Integration tests: Supervisor → StateMachine → ports, with the real
//! on-disk store where crash recovery is exercised.

use std::cell::Cell;

use prodcounter::adapters::FileStore;
use prodcounter::config::SystemConfig;
use prodcounter::error::IoError;
use prodcounter::events::{Event, EventQueue, EVENT_QUEUE_CAP};
use prodcounter::fsm::{DispatchOutcome, Mode, StateMachine};
use prodcounter::ports::{
    Clock, Guards, Presentation, RejectReason, SelfTest, SelfTestReport, Storage,
};
use prodcounter::session::{SessionSnapshot, Timestamp};
use prodcounter::supervisor::{Recovery, Supervisor};

// ── Mock implementations ──────────────────────────────────────

struct MockClock {
    now: Cell<u64>,
}

impl MockClock {
    fn at(secs: u64) -> Self {
        Self {
            now: Cell::new(secs),
        }
    }

    fn advance(&self, secs: u64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for MockClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.get())
    }

    fn hour_of(&self, t: Timestamp) -> u8 {
        ((t.0 / 3600) % 24) as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Shown {
    Ready,
    Rejected(RejectReason),
    Fault(String),
    Hour(u8),
    SelfTest(bool),
}

#[derive(Default)]
struct MockPanel {
    shown: Vec<Shown>,
    producing_ticks: u32,
}

impl Presentation for MockPanel {
    fn on_enter_ready(&mut self) {
        self.shown.push(Shown::Ready);
    }
    fn on_producing_tick(&mut self, _count: u16) {
        self.producing_ticks += 1;
    }
    fn on_rejected(&mut self, reason: RejectReason) {
        self.shown.push(Shown::Rejected(reason));
    }
    fn on_fault(&mut self, message: &str) {
        self.shown.push(Shown::Fault(message.to_owned()));
    }
    fn on_hour_logged(&mut self, hour: u8) {
        self.shown.push(Shown::Hour(hour));
    }
    fn on_self_test(&mut self, report: &SelfTestReport) {
        self.shown.push(Shown::SelfTest(report.all_ok()));
    }
}

struct MockGuards {
    start_ok: bool,
}

impl Guards for MockGuards {
    fn can_start_production(&self) -> bool {
        self.start_ok
    }
    fn can_stop_production(&self) -> bool {
        true
    }
}

struct MockSelfTest {
    storage_ok: bool,
}

impl SelfTest for MockSelfTest {
    fn run(&mut self) -> SelfTestReport {
        SelfTestReport {
            storage_ok: self.storage_ok,
            clock_ok: true,
        }
    }
}

struct Harness {
    clock: MockClock,
    panel: MockPanel,
    guards: MockGuards,
    self_test: MockSelfTest,
}

impl Harness {
    fn new() -> Self {
        Self {
            clock: MockClock::at(50_000),
            panel: MockPanel::default(),
            guards: MockGuards { start_ok: true },
            self_test: MockSelfTest { storage_ok: true },
        }
    }

    fn poll<S: Storage>(&mut self, sup: &mut Supervisor<'_>, storage: &mut S) {
        sup.poll(
            &self.clock,
            storage,
            &mut self.panel,
            &self.guards,
            &mut self.self_test,
        );
    }
}

// ── Full operator cycle against the real file store ───────────

#[test]
fn full_cycle_start_count_stop_with_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStore::open(dir.path()).unwrap();
    let queue = EventQueue::new();
    let mut h = Harness::new();

    let mut sup = Supervisor::new(StateMachine::new(&queue, SystemConfig::default()));
    assert_eq!(sup.boot(&mut storage), Recovery::Fresh);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Ready);
    assert_eq!(h.panel.shown, vec![Shown::Ready]);

    queue.push(Event::StartRequested);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Producing);

    for _ in 0..5 {
        queue.push(Event::ItemDetected);
    }
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().session().count(), 5);

    h.clock.advance(30);
    queue.push(Event::StopRequested);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Ready);
    assert_eq!(sup.machine().session().cumulative_count(), 5);
    assert!(h.panel.producing_ticks > 0);

    // The clean stop left an inactive snapshot on disk.
    let on_disk = storage.load().unwrap().unwrap();
    assert!(!on_disk.active);
    assert_eq!(on_disk.cumulative_count, 5);
}

#[test]
fn power_loss_mid_session_recovers_the_count() {
    let dir = tempfile::tempdir().unwrap();
    let queue = EventQueue::new();
    let mut h = Harness::new();

    // First life: start, count, autosave, then "lose power" by dropping
    // everything without a stop.
    {
        let mut storage = FileStore::open(dir.path()).unwrap();
        let mut sup = Supervisor::new(StateMachine::new(&queue, SystemConfig::default()));
        sup.boot(&mut storage);
        h.poll(&mut sup, &mut storage);
        queue.push(Event::StartRequested);
        h.poll(&mut sup, &mut storage);
        for _ in 0..7 {
            queue.push(Event::ItemDetected);
        }
        h.clock.advance(10);
        h.poll(&mut sup, &mut storage);
        // Interval elapsed (10s > 5s default), so the count hit the disk.
    }

    // Second life: boot from the same directory.
    let queue2 = EventQueue::new();
    let mut storage = FileStore::open(dir.path()).unwrap();
    let mut sup = Supervisor::new(StateMachine::new(&queue2, SystemConfig::default()));
    assert_eq!(sup.boot(&mut storage), Recovery::Restored);
    assert!(sup.machine().session().is_active());
    assert_eq!(sup.machine().session().count(), 7);

    // The first poll resumes the interrupted session in Producing with the
    // recovered count, not a reset one.
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Producing);
    assert_eq!(sup.machine().session().count(), 7);

    queue2.push(Event::ItemDetected);
    queue2.push(Event::StopRequested);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Ready);
    assert_eq!(sup.machine().session().cumulative_count(), 8);
}

#[test]
fn corrupted_snapshot_degrades_to_fresh_boot() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session.bin"), [0xFF; 32]).unwrap();

    let queue = EventQueue::new();
    let mut storage = FileStore::open(dir.path()).unwrap();
    let mut h = Harness::new();
    let mut sup = Supervisor::new(StateMachine::new(&queue, SystemConfig::default()));

    assert_eq!(sup.boot(&mut storage), Recovery::Degraded);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Ready);
    assert_eq!(sup.machine().session().count(), 0);
}

// ── Guard and fault paths ─────────────────────────────────────

#[test]
fn rejected_start_is_surfaced_and_harmless() {
    let queue = EventQueue::new();
    let mut h = Harness::new();
    h.guards.start_ok = false;
    let mut storage = NullStorage;
    let mut sup = Supervisor::new(StateMachine::new(&queue, SystemConfig::default()));
    sup.boot(&mut storage);
    h.poll(&mut sup, &mut storage);

    queue.push(Event::StartRequested);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Ready);
    assert!(
        h.panel
            .shown
            .contains(&Shown::Rejected(RejectReason::StartNotPermitted))
    );

    // Permitting the guard lets the same request through.
    h.guards.start_ok = true;
    queue.push(Event::StartRequested);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Producing);
}

#[test]
fn fault_during_production_saves_then_requires_explicit_clear() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStore::open(dir.path()).unwrap();
    let queue = EventQueue::new();
    let mut h = Harness::new();
    let mut sup = Supervisor::new(StateMachine::new(&queue, SystemConfig::default()));
    sup.boot(&mut storage);
    h.poll(&mut sup, &mut storage);

    queue.push(Event::StartRequested);
    queue.push(Event::ItemDetected);
    queue.push(Event::ItemDetected);
    queue.push(Event::FaultDetected);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Fault);

    // The in-flight session reached the disk on the way into Fault.
    let on_disk = storage.load().unwrap().unwrap();
    assert!(on_disk.active);
    assert_eq!(on_disk.count, 2);

    // Operator requests are ignored while faulted.
    queue.push(Event::StartRequested);
    queue.push(Event::ItemDetected);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Fault);
    assert_eq!(sup.machine().session().count(), 2);

    queue.push(Event::FaultCleared);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Ready);
}

#[test]
fn diagnostic_cycle_passes_and_returns_to_ready() {
    let queue = EventQueue::new();
    let mut h = Harness::new();
    let mut storage = NullStorage;
    let mut sup = Supervisor::new(StateMachine::new(&queue, SystemConfig::default()));
    sup.boot(&mut storage);
    h.poll(&mut sup, &mut storage);

    queue.push(Event::DiagnosticRequested);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Diagnostic);

    // Next iteration's tick runs the self-test; its completion event is
    // dispatched within the same poll.
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Ready);
    assert!(h.panel.shown.contains(&Shown::SelfTest(true)));
}

#[test]
fn failed_diagnostic_faults_the_machine() {
    let queue = EventQueue::new();
    let mut h = Harness::new();
    h.self_test.storage_ok = false;
    let mut storage = NullStorage;
    let mut sup = Supervisor::new(StateMachine::new(&queue, SystemConfig::default()));
    sup.boot(&mut storage);
    h.poll(&mut sup, &mut storage);

    queue.push(Event::DiagnosticRequested);
    h.poll(&mut sup, &mut storage);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Fault);
    assert!(h.panel.shown.contains(&Shown::SelfTest(false)));
}

// ── Hour boundary ─────────────────────────────────────────────

#[test]
fn hour_boundary_reports_without_disturbing_production() {
    let queue = EventQueue::new();
    let mut h = Harness::new();
    let mut storage = NullStorage;
    let mut sup = Supervisor::new(StateMachine::new(&queue, SystemConfig::default()));
    sup.boot(&mut storage);
    h.poll(&mut sup, &mut storage); // Ready, primes the hour monitor

    queue.push(Event::StartRequested);
    queue.push(Event::ItemDetected);
    h.poll(&mut sup, &mut storage);

    h.clock.advance(3600);
    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().mode(), Mode::Producing);
    assert_eq!(sup.machine().session().count(), 1);
    assert_eq!(
        h.panel
            .shown
            .iter()
            .filter(|s| matches!(s, Shown::Hour(_)))
            .count(),
        1
    );
}

// ── Queue overflow under burst load ───────────────────────────

#[test]
fn burst_overflow_drops_oldest_and_keeps_counting() {
    let queue = EventQueue::new();
    let mut h = Harness::new();
    let mut storage = NullStorage;
    let mut sup = Supervisor::new(StateMachine::new(&queue, SystemConfig::default()));
    sup.boot(&mut storage);
    h.poll(&mut sup, &mut storage);
    queue.push(Event::StartRequested);
    h.poll(&mut sup, &mut storage);

    // Twice the capacity in one burst: the oldest half is evicted.
    for _ in 0..(2 * EVENT_QUEUE_CAP) {
        queue.push(Event::ItemDetected);
    }
    assert_eq!(queue.dropped() as usize, EVENT_QUEUE_CAP);

    h.poll(&mut sup, &mut storage);
    assert_eq!(sup.machine().session().count() as usize, EVENT_QUEUE_CAP);
    assert!(queue.is_empty());
}

// ── Null storage used by the pure-logic tests ─────────────────

struct NullStorage;

impl Storage for NullStorage {
    fn persist(&mut self, _snap: &SessionSnapshot) -> Result<(), IoError> {
        Ok(())
    }
    fn load(&mut self) -> Result<Option<SessionSnapshot>, IoError> {
        Ok(None)
    }
}

// ── Dispatch outcomes at the API surface ──────────────────────

#[test]
fn dispatch_outcomes_distinguish_ignored_and_rejected() {
    let queue = EventQueue::new();
    let mut h = Harness::new();
    h.guards.start_ok = false;
    let mut storage = NullStorage;
    let mut machine = StateMachine::new(&queue, SystemConfig::default());

    // ItemDetected has no row in Initializing.
    let out = machine.dispatch_event(
        Event::ItemDetected,
        &h.clock,
        &mut storage,
        &mut h.panel,
        &h.guards,
    );
    assert_eq!(out, DispatchOutcome::Ignored);

    machine.dispatch_event(
        Event::InitComplete,
        &h.clock,
        &mut storage,
        &mut h.panel,
        &h.guards,
    );
    let out = machine.dispatch_event(
        Event::StartRequested,
        &h.clock,
        &mut storage,
        &mut h.panel,
        &h.guards,
    );
    assert_eq!(out, DispatchOutcome::GuardRejected);
}
