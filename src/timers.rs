//! Timing utilities for measuring how long a sequence takes to produce.
//!
//! The wrappers in this crate never own a timer. The caller creates one,
//! hands a handle to the wrapper, and reads the accumulated time afterwards.
//! All operations take `&self` so the same timer can be shared by several
//! wrappers on one thread.

use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Stopwatch-like timer driven by the timing wrappers.
///
/// Elapsed time accumulates across `start`/`stop` pairs until `reset`.
/// Implementations are not expected to be thread-safe.
pub trait Timer {
    /// Stop the timer and zero the accumulated time.
    fn reset(&self);

    /// Begin measuring. No-op when already running.
    fn start(&self);

    /// Stop measuring and fold the current interval into the total. No-op when
    /// already stopped.
    fn stop(&self);

    /// Whether an interval is currently being measured.
    fn is_running(&self) -> bool;

    /// Total measured time, including the in-progress interval if running.
    fn elapsed(&self) -> Duration;
}

impl<T: Timer + ?Sized> Timer for &T {
    fn reset(&self) {
        (**self).reset()
    }

    fn start(&self) {
        (**self).start()
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

impl<T: Timer + ?Sized> Timer for Rc<T> {
    fn reset(&self) {
        (**self).reset()
    }

    fn start(&self) {
        (**self).start()
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

impl<T: Timer + ?Sized> Timer for Box<T> {
    fn reset(&self) {
        (**self).reset()
    }

    fn start(&self) {
        (**self).start()
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

/// Accumulating wall-clock stopwatch.
///
/// # Example
///
/// ```rust
/// use timed_query::{Stopwatch, Timer};
///
/// let watch = Stopwatch::new();
/// watch.start();
/// // ... work being measured ...
/// watch.stop();
/// assert!(!watch.is_running());
/// ```
#[derive(Debug, Default)]
pub struct Stopwatch {
    accumulated: Cell<Duration>,
    started_at: Cell<Option<Instant>>,
}

impl Stopwatch {
    /// Create a stopped stopwatch with zero elapsed time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopwatch that is already running.
    pub fn start_new() -> Self {
        let watch = Self::new();
        watch.start();
        watch
    }

    /// Capture the current state in a serializable form.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::of(self)
    }
}

impl Timer for Stopwatch {
    fn reset(&self) {
        self.accumulated.set(Duration::ZERO);
        self.started_at.set(None);
    }

    fn start(&self) {
        if self.started_at.get().is_none() {
            self.started_at.set(Some(Instant::now()));
        }
    }

    fn stop(&self) {
        if let Some(started_at) = self.started_at.take() {
            self.accumulated
                .set(self.accumulated.get() + started_at.elapsed());
        }
    }

    fn is_running(&self) -> bool {
        self.started_at.get().is_some()
    }

    fn elapsed(&self) -> Duration {
        match self.started_at.get() {
            Some(started_at) => self.accumulated.get() + started_at.elapsed(),
            None => self.accumulated.get(),
        }
    }
}

/// Point-in-time view of a timer, suitable for logging or shipping elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    /// Accumulated time in milliseconds
    pub elapsed_ms: f64,
    /// Whether the timer was running when the snapshot was taken
    pub running: bool,
}

impl TimerSnapshot {
    pub fn of<T: Timer + ?Sized>(timer: &T) -> Self {
        Self {
            elapsed_ms: timer.elapsed().as_secs_f64() * 1_000.0,
            running: timer.is_running(),
        }
    }
}
