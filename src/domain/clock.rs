use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::sync::Mutex;

/// 時間來源。記錄的建立時間一律從這裡取得
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 牆上時鐘，截到毫秒以符合傳輸格式
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn from_millis(millis: i64) -> Self {
        Self(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Advances by `step` after every reading.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = match self.next.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = *next;
        *next = current + self.step;
        current
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::from_millis(1_700_000_000_000);
        assert_eq!(clock.now().timestamp_millis(), 1_700_000_000_000);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_system_clock_has_millisecond_precision() {
        let now = SystemClock.now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(DateTime::from_timestamp_millis(now.timestamp_millis()), Some(now));
    }

    #[test]
    fn test_stepping_clock_is_monotonic() {
        let clock = SteppingClock::new(FixedClock::from_millis(0).now(), Duration::seconds(1));
        let a = clock.now();
        let b = clock.now();
        assert_eq!((b - a).num_seconds(), 1);
    }
}
