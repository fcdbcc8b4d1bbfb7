use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::config::SchedulerConfig;
use crate::deadline::{Deadline, FrameDeadline};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// More work remains; run again in a later slice.
    Pending,
    Done,
}

/// A unit of schedulable work.
///
/// `run` is handed the slice deadline and decides itself where to stop; it is
/// never interrupted from outside.
pub trait Task {
    fn run(&self, deadline: &dyn Deadline) -> TaskStatus;

    fn name(&self) -> &str {
        "task"
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler still busy after {slices} slices")]
    Stalled { slices: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SliceReport {
    pub ran: usize,
    pub requeued: usize,
}

struct Inner {
    queue: RefCell<VecDeque<Rc<dyn Task>>>,
    config: SchedulerConfig,
    slices: Cell<u64>,
}

impl Inner {
    fn request_work(&self, task: Rc<dyn Task>) -> bool {
        let mut queue = self.queue.borrow_mut();
        if queue.iter().any(|queued| Rc::ptr_eq(queued, &task)) {
            return false;
        }
        log::trace!(target: "scheduler", "request work: {}", task.name());
        queue.push_back(task);
        true
    }
}

/// Cooperative task queue. Cloning shares the same queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

/// Weak reference to a scheduler, held by code that may outlive it.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Inner>,
}

impl SchedulerHandle {
    /// Queues `task` unless it is already queued.
    ///
    /// Returns `false` if the task was already queued or the scheduler is gone.
    pub fn request_work(&self, task: Rc<dyn Task>) -> bool {
        match self.inner.upgrade() {
            Some(inner) => inner.request_work(task),
            None => false,
        }
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                queue: RefCell::new(VecDeque::new()),
                config,
                slices: Cell::new(0),
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn request_work(&self, task: Rc<dyn Task>) -> bool {
        self.inner.request_work(task)
    }

    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Total slices run so far.
    pub fn slices(&self) -> u64 {
        self.inner.slices.get()
    }

    /// Runs each task queued at the start of the slice once.
    ///
    /// Tasks requested while the slice runs wait for the next slice. The queue
    /// is not borrowed while a task runs, so tasks may request more work.
    pub fn run_slice(&self, deadline: &dyn Deadline) -> SliceReport {
        let batch = self.pending();
        let mut report = SliceReport::default();
        for _ in 0..batch {
            let Some(task) = self.inner.queue.borrow_mut().pop_front() else {
                break;
            };
            report.ran += 1;
            if task.run(deadline) == TaskStatus::Pending {
                report.requeued += 1;
                self.inner.request_work(task);
            }
        }
        self.inner.slices.set(self.inner.slices.get() + 1);
        log::debug!(
            target: "scheduler",
            "slice {}: ran={} requeued={}",
            self.inner.slices.get(),
            report.ran,
            report.requeued
        );
        report
    }

    /// Runs wall-clock slices until no task is queued.
    pub fn run_until_idle(&self) -> Result<usize, SchedulerError> {
        let budget = self.inner.config.frame_budget;
        self.run_until_idle_with(|| FrameDeadline::new(budget))
    }

    /// Runs slices with deadlines from `make_deadline` until no task is queued.
    ///
    /// Returns the number of slices run.
    pub fn run_until_idle_with<D: Deadline>(
        &self,
        mut make_deadline: impl FnMut() -> D,
    ) -> Result<usize, SchedulerError> {
        let mut slices = 0;
        while !self.is_idle() {
            if slices >= self.inner.config.max_slices {
                log::warn!(target: "scheduler", "stalled after {slices} slices");
                return Err(SchedulerError::Stalled { slices });
            }
            let deadline = make_deadline();
            self.run_slice(&deadline);
            slices += 1;
        }
        Ok(slices)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
