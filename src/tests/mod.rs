use std::cell::{Cell, RefCell};
use std::time::Duration;

use crate::timers::Timer;


/// Timer that records every state-changing call made on it.
#[derive(Debug, Default)]
pub(crate) struct SpyTimer {
    calls: RefCell<Vec<&'static str>>,
    running: Cell<bool>,
}

impl SpyTimer {
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl Timer for SpyTimer {
    fn reset(&self) {
        self.calls.borrow_mut().push("reset");
        self.running.set(false);
    }

    fn start(&self) {
        self.calls.borrow_mut().push("start");
        self.running.set(true);
    }

    fn stop(&self) {
        self.calls.borrow_mut().push("stop");
        self.running.set(false);
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn elapsed(&self) -> Duration {
        Duration::ZERO
    }
}
