//! Unit-of-work traversal for one work-in-progress generation.

use std::rc::Rc;
use std::time::Duration;

use host::HostAdapter;
use scheduler::Deadline;

use crate::element::{Element, Props};
use crate::error::RenderError;
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId, FiberKind};
use crate::hooks::{Hooks, PendingEffect};
use crate::reconcile::{Deletion, reconcile_children};
use crate::root::UpdateSignal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WorkStatus {
    Yielded,
    Complete,
}

pub(crate) struct WorkLoop {
    pub(crate) root: FiberId,
    next: Option<FiberId>,
    pub(crate) deletions: Vec<Deletion>,
    pub(crate) effects: Vec<PendingEffect>,
    pub(crate) units: usize,
}

impl WorkLoop {
    /// Starts a generation rendering `element` into `container`, diffed
    /// against `current` when there is one.
    pub(crate) fn new(
        arena: &mut FiberArena,
        container: core_types::HostHandle,
        element: Element,
        current: Option<FiberId>,
    ) -> Self {
        let root = arena.insert(Fiber::root(
            container,
            Element::root_props(element),
            current,
        ));
        Self {
            root,
            next: Some(root),
            deletions: Vec::new(),
            effects: Vec::new(),
            units: 0,
        }
    }

    /// Performs units until the generation is built or the deadline runs low.
    ///
    /// At least one unit runs per call so a short deadline still makes
    /// progress.
    pub(crate) fn run<H: HostAdapter>(
        &mut self,
        arena: &mut FiberArena,
        host: &mut H,
        signal: &Rc<UpdateSignal>,
        deadline: &dyn Deadline,
        yield_threshold: Duration,
    ) -> Result<WorkStatus, RenderError> {
        let mut performed = 0usize;
        while let Some(fiber) = self.next {
            if performed > 0 && deadline.time_remaining() < yield_threshold {
                log::trace!(
                    target: "reconciler.work",
                    "yield after {performed} units"
                );
                return Ok(WorkStatus::Yielded);
            }
            self.next = self.perform_unit(arena, host, signal, fiber)?;
            performed += 1;
            self.units += 1;
        }
        Ok(WorkStatus::Complete)
    }

    fn perform_unit<H: HostAdapter>(
        &mut self,
        arena: &mut FiberArena,
        host: &mut H,
        signal: &Rc<UpdateSignal>,
        id: FiberId,
    ) -> Result<Option<FiberId>, RenderError> {
        let Some(fiber) = arena.get(id) else {
            return Ok(None);
        };
        let kind = fiber.kind.clone();
        let props: Rc<Props> = Rc::clone(&fiber.props);
        let alternate = fiber.alternate;
        let has_host = fiber.host.is_some();
        log::trace!(target: "reconciler.work", "unit {}", kind.label());

        let children: Vec<Element> = match &kind {
            FiberKind::Root => props.children().to_vec(),
            FiberKind::Host(tag) => {
                if !has_host {
                    let node = host.create_node(tag)?;
                    set_host(arena, id, node);
                }
                props.children().to_vec()
            }
            FiberKind::Text => {
                if !has_host {
                    let node = host.create_text_node()?;
                    set_host(arena, id, node);
                }
                Vec::new()
            }
            FiberKind::Component(component) => {
                let previous = alternate
                    .and_then(|alternate| arena.get(alternate))
                    .map(|f| f.hooks.clone());
                let mut hooks = Hooks::new(
                    component.name(),
                    previous.as_deref(),
                    &mut self.effects,
                    signal,
                );
                let rendered = component.render(&mut hooks, &props);
                let slots = hooks.finish();
                let component_error = |source| RenderError::Component {
                    component: component.name().to_string(),
                    source,
                };
                let element = rendered.map_err(component_error)?;
                let slots = slots.map_err(|err| component_error(err.into()))?;
                if let Some(fiber) = arena.get_mut(id) {
                    fiber.hooks = slots;
                }
                vec![element]
            }
        };

        reconcile_children(arena, id, &children, &mut self.deletions)?;
        Ok(arena.next_in_order(id))
    }

    /// Releases the host nodes this generation created. Only valid before the
    /// commit has attached any of them.
    pub(crate) fn release_created<H: HostAdapter>(&self, arena: &FiberArena, host: &mut H) {
        let mut released = 0usize;
        let mut cursor = arena.get(self.root).and_then(|f| f.child);
        while let Some(id) = cursor {
            if let Some(fiber) = arena.get(id) {
                if let (EffectTag::Placement, Some(node)) = (fiber.effect, fiber.host) {
                    match host.release_node(node) {
                        Ok(()) => released += 1,
                        Err(err) => log::warn!(
                            target: "reconciler.work",
                            "could not release {}: {err}",
                            fiber.kind.label()
                        ),
                    }
                }
            }
            cursor = arena.next_in_order(id);
        }
        log::trace!(target: "reconciler.work", "released {released} host nodes");
    }

    /// Drops the generation: frees its fibers and restores the tags of old
    /// fibers it had marked for deletion. The current tree is left as it was.
    pub(crate) fn discard(self, arena: &mut FiberArena) {
        for deletion in &self.deletions {
            if let Some(fiber) = arena.get_mut(deletion.fiber) {
                fiber.effect = deletion.prior;
            }
        }
        let freed = arena.free_generation(self.root);
        log::trace!(target: "reconciler.work", "discarded {freed} fibers");
    }
}

fn set_host(arena: &mut FiberArena, id: FiberId, node: core_types::HostHandle) {
    if let Some(fiber) = arena.get_mut(id) {
        debug_assert!(fiber.host.is_none(), "host node assigned twice");
        fiber.host = Some(node);
    }
}
