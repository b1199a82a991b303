use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, trace};

use crate::blink::{BlinkPhase, BlinkScheduler};
use crate::render::FramePair;

/// Events that end the render loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Signal {
    Quit,
    KeyPress,
    ButtonPress,
}

/// A display surface that can show one of two pre-built frames.
pub trait Presenter {
    /// Called once with both frames before the first `present`.
    fn upload(&mut self, frames: &FramePair) -> Result<()>;

    /// Shows the frame for `phase`. Only called when the phase changes.
    fn present(&mut self, phase: BlinkPhase) -> Result<()>;

    /// Waits at most `timeout` for a termination signal.
    fn poll_signal(&mut self, timeout: Duration) -> Result<Option<Signal>>;
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Runs until the presenter reports a termination signal, which is returned.
pub fn run<P, C>(presenter: &mut P, frames: &FramePair, clock: &C, period: Duration) -> Result<Signal>
where
    P: Presenter,
    C: Clock,
{
    presenter.upload(frames)?;

    let mut scheduler = BlinkScheduler::new(clock.now(), period);
    presenter.present(scheduler.phase())?;
    info!(
        width = frames.width(),
        height = frames.height(),
        period_ms = scheduler.period().as_millis() as u64,
        "presenting"
    );

    loop {
        let timeout = scheduler.time_until_flip(clock.now());
        trace!(?timeout, "waiting for events");

        if let Some(signal) = presenter.poll_signal(timeout)? {
            info!(?signal, "stopping");
            return Ok(signal);
        }

        if scheduler.update(clock.now()) {
            debug!(phase = ?scheduler.phase(), "blink flip");
            presenter.present(scheduler.phase())?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use anyhow::anyhow;

    use super::*;
    use crate::cell::Grid;
    use crate::font::GlyphTable;
    use crate::render::{FrameBuilder, Rasterizer};

    #[derive(Clone)]
    struct FakeClock(Rc<Cell<Instant>>);

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.0.get()
        }
    }

    /// Advances the fake clock by each timeout; emits `signal` after `polls` waits.
    struct Recorder {
        clock: FakeClock,
        uploads: usize,
        presented: Vec<BlinkPhase>,
        polls: usize,
        signal: Signal,
        fail_present: bool,
    }

    impl Recorder {
        fn new(clock: FakeClock, polls: usize, signal: Signal) -> Self {
            Self {
                clock,
                uploads: 0,
                presented: Vec::new(),
                polls,
                signal,
                fail_present: false,
            }
        }
    }

    impl Presenter for Recorder {
        fn upload(&mut self, _frames: &FramePair) -> Result<()> {
            self.uploads += 1;
            Ok(())
        }

        fn present(&mut self, phase: BlinkPhase) -> Result<()> {
            if self.fail_present {
                return Err(anyhow!("surface lost"));
            }
            self.presented.push(phase);
            Ok(())
        }

        fn poll_signal(&mut self, timeout: Duration) -> Result<Option<Signal>> {
            if self.polls == 0 {
                return Ok(Some(self.signal));
            }
            self.polls -= 1;
            let now = self.clock.0.get();
            self.clock.0.set(now + timeout);
            Ok(None)
        }
    }

    fn frames() -> FramePair {
        let glyphs = GlyphTable::builtin();
        FrameBuilder::new(Rasterizer::new(&glyphs, 8)).build(&Grid::new(1, 1))
    }

    #[test]
    fn presents_on_every_flip() {
        let clock = FakeClock(Rc::new(Cell::new(Instant::now())));
        let mut presenter = Recorder::new(clock.clone(), 4, Signal::KeyPress);

        let signal = run(&mut presenter, &frames(), &clock, Duration::from_millis(224)).unwrap();

        assert_eq!(signal, Signal::KeyPress);
        assert_eq!(presenter.uploads, 1);
        assert_eq!(
            presenter.presented,
            vec![
                BlinkPhase::Visible,
                BlinkPhase::Suppressed,
                BlinkPhase::Visible,
                BlinkPhase::Suppressed,
                BlinkPhase::Visible,
            ]
        );
    }

    #[test]
    fn every_signal_ends_the_loop() {
        for expected in [Signal::Quit, Signal::KeyPress, Signal::ButtonPress] {
            let clock = FakeClock(Rc::new(Cell::new(Instant::now())));
            let mut presenter = Recorder::new(clock.clone(), 0, expected);
            let signal = run(&mut presenter, &frames(), &clock, Duration::from_millis(10)).unwrap();
            assert_eq!(signal, expected);
            assert_eq!(presenter.presented, vec![BlinkPhase::Visible]);
        }
    }

    #[test]
    fn presenter_errors_are_fatal() {
        let clock = FakeClock(Rc::new(Cell::new(Instant::now())));
        let mut presenter = Recorder::new(clock.clone(), 3, Signal::Quit);
        presenter.fail_present = true;
        assert!(run(&mut presenter, &frames(), &clock, Duration::from_millis(10)).is_err());
    }
}
