//! Production counter — host entry point.
//!
//! Hexagonal architecture with event-driven execution:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  SystemClock   FileStore   LogPresenter   LatchGuards    │
//! │  (Clock)       (Storage)   (Presentation) (Guards)       │
//! │                                                          │
//! │  ────────────── Port Trait Boundary ──────────────       │
//! │                                                          │
//! │  ┌──────────────────────────────────────────────────┐    │
//! │  │          StateMachine + ProductionSession        │    │
//! │  └──────────────────────────────────────────────────┘    │
//! │                                                          │
//! │  Supervisor (boot recovery · autosave)                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! On the host the "interrupts" are a console thread: each line typed by
//! the operator becomes an event pushed onto the shared queue, exactly
//! the way a sensor ISR would push on the device.

#![deny(unused_must_use)]

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use prodcounter::adapters::{BasicSelfTest, FileStore, LatchGuards, LogPresenter, SystemClock};
use prodcounter::config::SystemConfig;
use prodcounter::events::{Event, EventQueue};
use prodcounter::fsm::{Mode, StateMachine};
use prodcounter::supervisor::Supervisor;

/// The shared event queue. Static so the console thread (standing in for
/// ISRs) can push without any lifetime plumbing.
static EVENTS: EventQueue = EventQueue::new();

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

fn data_dir() -> PathBuf {
    std::env::var_os("PRODCOUNTER_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn load_config(dir: &std::path::Path) -> SystemConfig {
    let path = dir.join("config.json");
    match std::fs::read_to_string(&path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(cfg) => {
                info!("config loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("config parse failed ({e}), using defaults");
                SystemConfig::default()
            }
        },
        Err(_) => {
            info!("no config file, using defaults");
            SystemConfig::default()
        }
    }
}

/// Map one console line to an event, mirroring the hardware inputs: the
/// item sensor, the start/stop buttons, the diagnostic switch and the
/// fault-reset key.
fn parse_command(line: &str) -> Option<Event> {
    match line.trim() {
        "item" | "i" => Some(Event::ItemDetected),
        "start" => Some(Event::StartRequested),
        "stop" => Some(Event::StopRequested),
        "diag" => Some(Event::DiagnosticRequested),
        "fault" => Some(Event::FaultDetected),
        "clear" => Some(Event::FaultCleared),
        _ => None,
    }
}

fn spawn_console_thread() {
    std::thread::spawn(|| {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let trimmed = line.trim();
            if trimmed == "quit" || trimmed == "q" {
                SHUTDOWN.store(true, Ordering::Release);
                break;
            }
            match parse_command(trimmed) {
                Some(event) => {
                    if !EVENTS.push(event) {
                        warn!("console: queue full, oldest event dropped");
                    }
                }
                None if trimmed.is_empty() => {}
                None => warn!("console: unknown command '{trimmed}'"),
            }
        }
        SHUTDOWN.store(true, Ordering::Release);
    });
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("prodcounter v{}", env!("CARGO_PKG_VERSION"));

    let dir = data_dir();
    let config = load_config(&dir);
    let interval = Duration::from_millis(u64::from(config.control_loop_interval_ms));

    let clock = SystemClock;
    let mut storage = FileStore::open(&dir)
        .with_context(|| format!("opening data directory {}", dir.display()))?;
    // The self-test probes through its own storage handle so a wedged
    // primary handle cannot mask itself.
    let probe_store = FileStore::open(&dir)?;
    let mut self_test = BasicSelfTest::new(SystemClock, probe_store);
    let mut present = LogPresenter::new();
    let (guards, latch) = LatchGuards::new();
    latch.set_enabled(true);
    latch.set_available(true);

    let machine = StateMachine::new(&EVENTS, config);
    let mut sup = Supervisor::new(machine);
    sup.boot(&mut storage);

    spawn_console_thread();
    info!("commands: start stop item diag fault clear quit");

    while !SHUTDOWN.load(Ordering::Acquire) {
        sup.poll(&clock, &mut storage, &mut present, &guards, &mut self_test);
        std::thread::sleep(interval);
    }

    // One final drain so a queued stop lands before the last save.
    sup.poll(&clock, &mut storage, &mut present, &guards, &mut self_test);

    let machine = sup.machine();
    if machine.mode() == Mode::Producing {
        warn!(
            "shutting down mid-session: count={} will be recovered on next boot",
            machine.session().count()
        );
    }
    let dropped = EVENTS.dropped();
    if dropped > 0 {
        warn!("{dropped} events were dropped by queue overflow this run");
    }
    info!(
        "shutdown: cumulative_count={} transitions={}",
        machine.session().cumulative_count(),
        machine.stats().transitions
    );
    Ok(())
}
