//! Presentation adapter that writes operator-facing output through the log
//! facade. Production ticks are throttled so a busy line does not flood
//! the output with one line per item.

use log::{error, info, warn};

use crate::ports::{Presentation, RejectReason, SelfTestReport};

/// Report a producing count line at most every this many items.
const COUNT_REPORT_STRIDE: u16 = 10;

pub struct LogPresenter {
    last_reported: Option<u16>,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self {
            last_reported: None,
        }
    }
}

impl Default for LogPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presentation for LogPresenter {
    fn on_enter_ready(&mut self) {
        self.last_reported = None;
        info!("ready for production");
    }

    fn on_producing_tick(&mut self, count: u16) {
        let due = match self.last_reported {
            None => true,
            Some(prev) => count >= prev.saturating_add(COUNT_REPORT_STRIDE),
        };
        if due {
            self.last_reported = Some(count);
            info!("producing: count={count}");
        }
    }

    fn on_rejected(&mut self, reason: RejectReason) {
        warn!("request rejected: {reason}");
    }

    fn on_fault(&mut self, message: &str) {
        error!("{message}");
    }

    fn on_hour_logged(&mut self, hour: u8) {
        info!("hourly report: hour={hour:02}");
    }

    fn on_self_test(&mut self, report: &SelfTestReport) {
        if report.all_ok() {
            info!("self-test passed");
        } else {
            warn!(
                "self-test failed: storage_ok={} clock_ok={}",
                report.storage_ok, report.clock_ok
            );
        }
    }
}
