use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, Local, TimeDelta, Utc};

/// Source of "now" for everything time-dependent. Reminder evaluation reads
/// the wall-clock part of the returned value, so the offset matters.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Real time, in the host's local offset unless a fixed one is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    pub fn local() -> Self {
        Self { offset: None }
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset),
            None => Local::now().fixed_offset(),
        }
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, value: DateTime<FixedOffset>) {
        *self.lock() = value;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.lock();
        *guard += delta;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<FixedOffset>> {
        match self.now.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn manual_clock_advances() {
        let start = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
            .unwrap();
        let clock = ManualClock::new(start);
        clock.advance(TimeDelta::minutes(90));
        assert_eq!(clock.now().hour(), 10);
        assert_eq!(clock.now().minute(), 30);
        assert_eq!(clock.now_utc().hour(), 9);
    }

    #[test]
    fn fixed_offset_system_clock_reports_that_offset() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let clock = SystemClock::with_offset(offset);
        assert_eq!(clock.now().offset(), &offset);
    }
}
