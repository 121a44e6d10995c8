//! Explicit poll cadences. Each periodic concern (clock tick, list poll,
//! log poll) is a `Cadence` value with a start/stop lifecycle, checked
//! against an injected clock so tests advance time without real timers.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct Cadence {
    period: Duration,
    active: bool,
    last_fired: Option<DateTime<Utc>>,
}

impl Cadence {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            active: false,
            last_fired: None,
        }
    }

    /// Arms the cadence; the first `poll` at or after `now + period` fires.
    /// The immediate fetch on start is the caller's job, which keeps
    /// "fetch now" and "fetch on a schedule" visibly separate.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.active = true;
        self.last_fired = Some(now);
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.last_fired = None;
    }

    /// True at most once per period while active.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        let due = match self.last_fired {
            Some(last_fired) => now - last_fired >= self.period,
            None => true,
        };
        if due {
            self.last_fired = Some(now);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn fires_once_per_period() {
        let mut cadence = Cadence::new(Duration::seconds(3));
        cadence.start(at(100));
        assert!(!cadence.poll(at(101)));
        assert!(!cadence.poll(at(102)));
        assert!(cadence.poll(at(103)));
        assert!(!cadence.poll(at(104)));
        assert!(cadence.poll(at(106)));
    }

    #[test]
    fn never_fires_while_stopped() {
        let mut cadence = Cadence::new(Duration::seconds(1));
        assert!(!cadence.poll(at(500)));
        cadence.start(at(500));
        cadence.stop();
        assert!(!cadence.poll(at(10_000)));
    }

    #[test]
    fn restart_resets_the_phase() {
        let mut cadence = Cadence::new(Duration::seconds(3));
        cadence.start(at(100));
        assert!(cadence.poll(at(103)));
        cadence.stop();
        cadence.start(at(200));
        assert!(!cadence.poll(at(201)));
        assert!(cadence.poll(at(203)));
    }
}
