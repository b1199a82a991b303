use std::time::{Duration, Instant};

/// Sixteen ticks of the 70 Hz text-mode refresh, in whole milliseconds:
/// `(1000 / 70) * 16` with integer division.
pub const BLINK_PERIOD: Duration = Duration::from_millis((1000 / 70) * 16);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum BlinkPhase {
    /// Blinking cells show their foreground.
    #[default]
    Visible,
    /// Blinking cells show background only.
    Suppressed,
}

impl BlinkPhase {
    pub fn flipped(self) -> Self {
        match self {
            Self::Visible => Self::Suppressed,
            Self::Suppressed => Self::Visible,
        }
    }

    /// Phase after `elapsed` time from an epoch that started `Visible`.
    pub fn at(elapsed: Duration, period: Duration) -> Self {
        let flips = elapsed.as_nanos() / period.as_nanos().max(1);
        if flips % 2 == 0 {
            Self::Visible
        } else {
            Self::Suppressed
        }
    }
}

/// Alternates between the two blink phases on a fixed period.
///
/// Deadlines advance from the previous deadline rather than from the time of
/// the check, so late checks do not accumulate drift.
#[derive(Debug, Clone)]
pub struct BlinkScheduler {
    phase: BlinkPhase,
    deadline: Instant,
    period: Duration,
}

impl BlinkScheduler {
    /// A zero period is bumped to one millisecond.
    pub fn new(epoch: Instant, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            phase: BlinkPhase::Visible,
            deadline: epoch + period,
            period,
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Flips once for every deadline `now` has reached. Returns whether the
    /// phase differs from before the call.
    pub fn update(&mut self, now: Instant) -> bool {
        let before = self.phase;
        while now >= self.deadline {
            self.phase = self.phase.flipped();
            self.deadline += self.period;
        }
        self.phase != before
    }

    pub fn time_until_flip(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(100);

    #[test]
    fn period_matches_hardware_rate() {
        assert_eq!(BLINK_PERIOD, Duration::from_millis(224));
    }

    #[test]
    fn starts_visible() {
        let epoch = Instant::now();
        let scheduler = BlinkScheduler::new(epoch, PERIOD);
        assert_eq!(scheduler.phase(), BlinkPhase::Visible);
        assert_eq!(scheduler.deadline(), epoch + PERIOD);
    }

    #[test]
    fn flips_at_deadline() {
        let epoch = Instant::now();
        let mut scheduler = BlinkScheduler::new(epoch, PERIOD);

        assert!(!scheduler.update(epoch + Duration::from_millis(99)));
        assert_eq!(scheduler.phase(), BlinkPhase::Visible);

        assert!(scheduler.update(epoch + PERIOD));
        assert_eq!(scheduler.phase(), BlinkPhase::Suppressed);
        assert_eq!(scheduler.deadline(), epoch + PERIOD * 2);
    }

    #[test]
    fn late_checks_do_not_drift() {
        let epoch = Instant::now();
        let mut scheduler = BlinkScheduler::new(epoch, PERIOD);

        scheduler.update(epoch + Duration::from_millis(130));
        assert_eq!(scheduler.deadline(), epoch + PERIOD * 2);
        assert_eq!(
            scheduler.time_until_flip(epoch + Duration::from_millis(130)),
            Duration::from_millis(70)
        );
    }

    #[test]
    fn sparse_checks_catch_up() {
        let epoch = Instant::now();
        let mut scheduler = BlinkScheduler::new(epoch, PERIOD);

        // two deadlines passed: back to visible, nothing changed
        assert!(!scheduler.update(epoch + Duration::from_millis(250)));
        assert_eq!(scheduler.phase(), BlinkPhase::Visible);
        assert_eq!(scheduler.deadline(), epoch + PERIOD * 3);

        assert!(scheduler.update(epoch + Duration::from_millis(310)));
        assert_eq!(scheduler.phase(), BlinkPhase::Suppressed);
    }

    #[test]
    fn time_until_flip_saturates() {
        let epoch = Instant::now();
        let scheduler = BlinkScheduler::new(epoch, PERIOD);
        assert_eq!(scheduler.time_until_flip(epoch + PERIOD * 5), Duration::ZERO);
    }

    #[test]
    fn phase_at_elapsed() {
        assert_eq!(BlinkPhase::at(Duration::ZERO, PERIOD), BlinkPhase::Visible);
        assert_eq!(BlinkPhase::at(PERIOD, PERIOD), BlinkPhase::Suppressed);
        assert_eq!(BlinkPhase::at(PERIOD * 7 / 2, PERIOD), BlinkPhase::Suppressed);
        assert_eq!(BlinkPhase::at(PERIOD * 4, PERIOD), BlinkPhase::Visible);
    }
}
