//! Timing adapter for plain iterators.
//!
//! [`TimedSeq`] resets and starts the timer when the first element is
//! requested and stops it once the source reports exhaustion. There is no
//! drop hook: a consumer that stops pulling early leaves the timer running.
//! This differs from [`TimedCursor`](crate::query::TimedCursor), which stops
//! on disposal.

use tracing::debug;

use crate::timers::Timer;
use crate::traits::ElementType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Running,
    Finished,
}

/// Lazy, single-pass iterator that times a full traversal of `source`.
#[derive(Debug)]
pub struct TimedSeq<I, T> {
    source: I,
    timer: T,
    state: State,
}

impl<I, T> TimedSeq<I, T>
where
    I: Iterator,
    T: Timer,
{
    /// Wrap `source`. Nothing happens to `timer` until the first pull.
    pub fn new(source: I, timer: T) -> Self {
        Self {
            source,
            timer,
            state: State::NotStarted,
        }
    }

    /// The timer this traversal drives.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// True once the source has been exhausted and the timer stopped.
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }
}

impl<I, T> Iterator for TimedSeq<I, T>
where
    I: Iterator,
    T: Timer,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        match self.state {
            State::Finished => return None,
            State::NotStarted => {
                self.timer.reset();
                self.timer.start();
                self.state = State::Running;
                debug!(
                    event = "Timer",
                    phase = "Start",
                    element_type = %ElementType::of::<I::Item>()
                );
            }
            State::Running => {}
        }

        let item = self.source.next();
        if item.is_none() {
            self.timer.stop();
            self.state = State::Finished;
            debug!(
                event = "Timer",
                phase = "Exhausted",
                element_type = %ElementType::of::<I::Item>(),
                elapsed_ms = self.timer.elapsed().as_secs_f64() * 1_000.0
            );
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            State::Finished => (0, Some(0)),
            _ => self.source.size_hint(),
        }
    }
}

impl<I, T> std::iter::FusedIterator for TimedSeq<I, T>
where
    I: Iterator,
    T: Timer,
{
}
