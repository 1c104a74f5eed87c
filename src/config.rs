//! System configuration parameters
//!
//! All tunable parameters for the production counter. Values arrive from
//! the configuration store already validated; the core only consumes them.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Counting ---
    /// Maximum session count; `increment` saturates here (does not wrap)
    pub max_count: u16,

    // --- Persistence ---
    /// Minimum interval between recovery-snapshot writes while producing (ms)
    pub save_interval_ms: u32,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Abort initialization and fault if it has not completed by this (seconds)
    pub init_timeout_secs: u16,
    /// Warn when the count has not moved for this long while producing (seconds)
    pub stall_warn_secs: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_count: 9999,

            save_interval_ms: 5000,

            control_loop_interval_ms: 100, // 10 Hz
            init_timeout_secs: 30,
            stall_warn_secs: 120,
        }
    }
}

impl SystemConfig {
    /// Control loop ticks that make up one second.
    pub fn ticks_per_sec(&self) -> u64 {
        u64::from(1000 / self.control_loop_interval_ms.max(1))
    }
}
