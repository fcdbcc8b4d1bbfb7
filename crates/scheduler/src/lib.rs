//! # scheduler
//!
//! Single-threaded cooperative scheduling: a queue of tasks that run in
//! slices bounded by a [`Deadline`]. A task that has more work returns
//! [`TaskStatus::Pending`] and is queued again, which continues multi-slice
//! work without the task re-registering itself.
//!
//! Deadlines are injected so tests can drive slices deterministically with
//! [`StepDeadline`] instead of the wall clock.

mod config;
mod deadline;
mod queue;

pub use config::SchedulerConfig;
pub use deadline::{Deadline, FrameDeadline, StepDeadline};
pub use queue::{Scheduler, SchedulerError, SchedulerHandle, SliceReport, Task, TaskStatus};
