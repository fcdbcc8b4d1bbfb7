use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Wall-clock budget of one slice (the idle period handed to tasks).
    pub frame_budget: Duration,
    /// Tasks yield once less than this much time remains in the slice.
    pub yield_threshold: Duration,
    /// `run_until_idle` gives up after this many slices.
    pub max_slices: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_budget: Duration::from_millis(50),
            yield_threshold: Duration::from_millis(1),
            max_slices: 10_000,
        }
    }
}

impl SchedulerConfig {
    pub fn with_frame_budget(mut self, budget: Duration) -> Self {
        self.frame_budget = budget;
        self
    }

    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    pub fn with_max_slices(mut self, max_slices: usize) -> Self {
        self.max_slices = max_slices;
        self
    }
}
