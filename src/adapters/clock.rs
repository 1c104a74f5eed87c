//! System clock adapter.
//!
//! Reads wall-clock time from `std::time::SystemTime` as whole seconds
//! since the Unix epoch. `hour_of` derives the UTC hour arithmetically so
//! hour-boundary detection never depends on timezone configuration.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::ports::Clock;
use crate::session::Timestamp;

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // A clock before 1970 is a misconfigured host; report epoch rather
        // than panic and let the hour monitor catch up when it recovers.
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Timestamp(secs)
    }

    fn hour_of(&self, t: Timestamp) -> u8 {
        ((t.0 / 3600) % 24) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > Timestamp(1_577_836_800));
    }

    #[test]
    fn hour_of_wraps_daily() {
        let c = SystemClock;
        assert_eq!(c.hour_of(Timestamp(0)), 0);
        assert_eq!(c.hour_of(Timestamp(3600)), 1);
        assert_eq!(c.hour_of(Timestamp(23 * 3600)), 23);
        assert_eq!(c.hour_of(Timestamp(24 * 3600)), 0);
        assert_eq!(c.hour_of(Timestamp(25 * 3600 + 59)), 1);
    }
}
