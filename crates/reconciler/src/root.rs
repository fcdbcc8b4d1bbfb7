//! Render roots.
//!
//! A root owns the host tree and both fiber generations, and registers itself
//! as a task with a [`Scheduler`]. Each task run advances the current cycle:
//! `Idle -> Working -> Committing -> Idle`. Work yields between units when the
//! slice deadline runs low; the commit and the effects that follow it never
//! yield.
//!
//! State updates only mark the root as requested. A request made while a cycle
//! is in flight is picked up after that cycle commits, by starting a fresh
//! generation from the committed tree.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};
use std::time::Duration;

use core_types::{CommitVersion, HostHandle};
use host::HostAdapter;
use scheduler::{Deadline, Scheduler, SchedulerHandle, Task, TaskStatus};

use crate::commit::commit_root;
use crate::element::Element;
use crate::error::RenderError;
use crate::fiber::{FiberArena, FiberId, FiberSummary};
use crate::hooks::PendingEffect;
use crate::work::{WorkLoop, WorkStatus};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RootPhase {
    #[default]
    Idle,
    Working,
    Committing,
}

/// What the most recent commit applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitReport {
    pub version: CommitVersion,
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    /// Units of work performed to build the committed generation.
    pub units: usize,
}

/// Shared between a root and every update queue created under it.
pub(crate) struct UpdateSignal {
    requested: Cell<bool>,
    phase: Cell<RootPhase>,
    scheduler: SchedulerHandle,
    task: Weak<dyn Task>,
}

impl UpdateSignal {
    fn new(scheduler: SchedulerHandle, task: Weak<dyn Task>) -> Self {
        Self {
            requested: Cell::new(false),
            phase: Cell::new(RootPhase::Idle),
            scheduler,
            task,
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(scheduler: SchedulerHandle) -> Self {
        struct Detached;
        impl Task for Detached {
            fn run(&self, _: &dyn Deadline) -> TaskStatus {
                TaskStatus::Done
            }
        }
        let task: Weak<dyn Task> = Weak::<Detached>::new();
        Self::new(scheduler, task)
    }

    /// Marks the root as needing a render and queues it when idle.
    pub(crate) fn notify(&self) {
        self.requested.set(true);
        if self.phase.get() != RootPhase::Idle {
            log::trace!(target: "reconciler.work", "update deferred until idle");
            return;
        }
        if let Some(task) = self.task.upgrade() {
            self.scheduler.request_work(task);
        }
    }

    fn take_request(&self) -> bool {
        self.requested.replace(false)
    }

    fn set_phase(&self, phase: RootPhase) {
        self.phase.set(phase);
    }
}

struct RootCore<H> {
    host: H,
    container: HostHandle,
    arena: FiberArena,
    current: Option<FiberId>,
    work: Option<WorkLoop>,
    yield_threshold: Duration,
    version: CommitVersion,
    last_commit: Option<CommitReport>,
    last_error: Option<RenderError>,
}

impl<H: HostAdapter> RootCore<H> {
    fn begin(&mut self, element: Element) {
        log::trace!(
            target: "reconciler.work",
            "begin generation (update: {})",
            self.current.is_some()
        );
        self.work = Some(WorkLoop::new(
            &mut self.arena,
            self.container,
            element,
            self.current,
        ));
    }

    fn perform(
        &mut self,
        deadline: &dyn Deadline,
        signal: &Rc<UpdateSignal>,
    ) -> Result<WorkStatus, RenderError> {
        let Some(work) = self.work.as_mut() else {
            return Ok(WorkStatus::Complete);
        };
        let result = work.run(
            &mut self.arena,
            &mut self.host,
            signal,
            deadline,
            self.yield_threshold,
        );
        if result.is_err() {
            if let Some(work) = self.work.take() {
                work.release_created(&self.arena, &mut self.host);
                work.discard(&mut self.arena);
            }
        }
        result
    }

    fn commit(&mut self) -> Result<Vec<PendingEffect>, RenderError> {
        let Some(work) = self.work.take() else {
            return Ok(Vec::new());
        };
        let counts = match commit_root(&mut self.arena, &mut self.host, work.root, &work.deletions)
        {
            Ok(counts) => counts,
            Err(err) => {
                work.discard(&mut self.arena);
                return Err(err);
            }
        };
        if let Some(previous) = self.current.replace(work.root) {
            self.arena.free_generation(previous);
        }
        self.version = self.version.next();
        let report = CommitReport {
            version: self.version,
            placements: counts.placements,
            updates: counts.updates,
            deletions: work.deletions.len(),
            units: work.units,
        };
        log::debug!(
            target: "reconciler.commit",
            "commit {}: placements={} updates={} deletions={} units={} fibers={}",
            report.version.0,
            report.placements,
            report.updates,
            report.deletions,
            report.units,
            self.arena.len()
        );
        self.last_commit = Some(report);
        Ok(work.effects)
    }

    fn fail(&mut self, err: RenderError) {
        log::warn!(target: "reconciler.work", "render aborted: {err}");
        self.last_error = Some(err);
    }
}

/// The scheduled side of a root.
struct RootTask<H> {
    core: RefCell<RootCore<H>>,
    element: RefCell<Option<Element>>,
    signal: Rc<UpdateSignal>,
}

impl<H: HostAdapter + 'static> RootTask<H> {
    fn finish_failed(&self, mut core: RefMut<'_, RootCore<H>>, err: RenderError) -> TaskStatus {
        core.fail(err);
        // The failed update is not retried.
        self.signal.take_request();
        self.signal.set_phase(RootPhase::Idle);
        TaskStatus::Done
    }
}

impl<H: HostAdapter + 'static> Task for RootTask<H> {
    fn run(&self, deadline: &dyn Deadline) -> TaskStatus {
        let Ok(mut core) = self.core.try_borrow_mut() else {
            return TaskStatus::Pending;
        };

        if core.work.is_none() {
            let requested = self.signal.take_request();
            let element = self.element.borrow().clone();
            match element {
                Some(element) if requested => core.begin(element),
                _ => {
                    self.signal.set_phase(RootPhase::Idle);
                    return TaskStatus::Done;
                }
            }
            self.signal.set_phase(RootPhase::Working);
        }

        match core.perform(deadline, &self.signal) {
            Ok(WorkStatus::Yielded) => return TaskStatus::Pending,
            Ok(WorkStatus::Complete) => {}
            Err(err) => return self.finish_failed(core, err),
        }

        self.signal.set_phase(RootPhase::Committing);
        let effects = match core.commit() {
            Ok(effects) => effects,
            Err(err) => return self.finish_failed(core, err),
        };
        drop(core);

        for effect in effects {
            effect();
        }
        self.signal.set_phase(RootPhase::Idle);
        if self.signal.requested.get() {
            TaskStatus::Pending
        } else {
            TaskStatus::Done
        }
    }

    fn name(&self) -> &str {
        "root"
    }
}

/// Handle to a render root.
pub struct Root<H: HostAdapter + 'static> {
    task: Rc<RootTask<H>>,
    scheduler: Scheduler,
}

/// Creates a root rendering into `container`, a node owned by `host`.
pub fn create_root<H: HostAdapter + 'static>(
    host: H,
    container: HostHandle,
    scheduler: &Scheduler,
) -> Root<H> {
    let handle = scheduler.handle();
    let yield_threshold = scheduler.config().yield_threshold;
    let task = Rc::new_cyclic(|weak: &Weak<RootTask<H>>| {
        let task: Weak<dyn Task> = weak.clone();
        RootTask {
            core: RefCell::new(RootCore {
                host,
                container,
                arena: FiberArena::new(),
                current: None,
                work: None,
                yield_threshold,
                version: CommitVersion::INITIAL,
                last_commit: None,
                last_error: None,
            }),
            element: RefCell::new(None),
            signal: Rc::new(UpdateSignal::new(handle, task)),
        }
    });
    Root {
        task,
        scheduler: scheduler.clone(),
    }
}

impl<H: HostAdapter + 'static> Root<H> {
    /// Replaces the root element and schedules a render.
    ///
    /// Nothing touches the host tree until the scheduler runs the root. Once a
    /// tree is committed, rendering again diffs against it.
    pub fn render(&self, element: impl Into<Element>) {
        *self.task.element.borrow_mut() = Some(element.into());
        self.task.signal.notify();
    }

    /// Runs `f`, then drives the scheduler until it is idle.
    ///
    /// Returns the render error recorded while settling, if any.
    pub fn act<R>(&self, f: impl FnOnce() -> R) -> Result<R, RenderError> {
        let out = f();
        self.scheduler.run_until_idle()?;
        match self.take_error() {
            Some(err) => Err(err),
            None => Ok(out),
        }
    }

    pub fn host(&self) -> Ref<'_, H> {
        Ref::map(self.task.core.borrow(), |core| &core.host)
    }

    pub fn host_mut(&self) -> RefMut<'_, H> {
        RefMut::map(self.task.core.borrow_mut(), |core| &mut core.host)
    }

    pub fn container(&self) -> HostHandle {
        self.task.core.borrow().container
    }

    pub fn phase(&self) -> RootPhase {
        self.task.signal.phase.get()
    }

    pub fn last_commit(&self) -> Option<CommitReport> {
        self.task.core.borrow().last_commit
    }

    pub fn version(&self) -> CommitVersion {
        self.task.core.borrow().version
    }

    /// Summaries of the committed tree in depth-first order, root first.
    pub fn current_tree(&self) -> Vec<FiberSummary> {
        let core = self.task.core.borrow();
        match core.current {
            Some(root) => core.arena.summaries(root),
            None => Vec::new(),
        }
    }

    /// Live fibers across both generations.
    pub fn fiber_count(&self) -> usize {
        self.task.core.borrow().arena.len()
    }

    pub fn take_error(&self) -> Option<RenderError> {
        self.task.core.borrow_mut().last_error.take()
    }
}
