use std::cell::Cell;
use std::time::{Duration, Instant};

/// Time left in the current slice.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

/// Wall-clock deadline: `budget` measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct FrameDeadline {
    start: Instant,
    budget: Duration,
}

impl FrameDeadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }
}

impl Deadline for FrameDeadline {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

/// Deterministic deadline for tests.
///
/// Each query consumes one step. While steps remain it reports a full frame;
/// once they run out it reports zero.
#[derive(Debug)]
pub struct StepDeadline {
    steps: Cell<usize>,
    frame: Duration,
}

impl StepDeadline {
    pub fn new(steps: usize) -> Self {
        Self {
            steps: Cell::new(steps),
            frame: Duration::from_millis(50),
        }
    }

    pub fn steps_left(&self) -> usize {
        self.steps.get()
    }
}

impl Deadline for StepDeadline {
    fn time_remaining(&self) -> Duration {
        let left = self.steps.get();
        if left == 0 {
            return Duration::ZERO;
        }
        self.steps.set(left - 1);
        self.frame
    }
}
