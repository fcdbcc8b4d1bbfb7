//! Positional child diff.
//!
//! New child elements are walked in lock-step with the old fiber chain
//! (`parent.alternate.child`, then siblings). Matching is by index and type
//! only; there are no keys.

use crate::element::Element;
use crate::error::RenderError;
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId};

/// An old fiber tagged for deletion, with the tag it had before.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Deletion {
    pub(crate) fiber: FiberId,
    pub(crate) prior: EffectTag,
}

/// Builds `parent`'s work-in-progress children from `elements`.
///
/// - same index, same type: `Update`, sharing the old host node
/// - different type, or no old fiber: `Placement`
/// - an old fiber that is not reused: `Deletion`, queued on `deletions`
pub(crate) fn reconcile_children(
    arena: &mut FiberArena,
    parent: FiberId,
    elements: &[Element],
    deletions: &mut Vec<Deletion>,
) -> Result<(), RenderError> {
    let mut old = arena
        .get(parent)
        .and_then(|f| f.alternate)
        .and_then(|alternate| arena.get(alternate))
        .and_then(|f| f.child);
    let mut previous: Option<FiberId> = None;
    let mut index = 0;

    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let old_fiber = old.and_then(|id| arena.get(id).map(|f| (id, f)));
        let matched = match (element, old_fiber) {
            (Some(element), Some((_, fiber))) => fiber.kind.matches(element.ty()),
            _ => false,
        };
        let next_old = old_fiber.and_then(|(_, f)| f.sibling);

        let fiber = match (element, old_fiber) {
            (Some(element), Some((old_id, old_fiber))) if matched => Some(Fiber::update(
                element,
                parent,
                old_id,
                old_fiber.host,
            )?),
            (Some(element), _) => Some(Fiber::placement(element, parent)?),
            (None, _) => None,
        };

        if let Some(old_id) = old.filter(|_| !matched) {
            if let Some(old_fiber) = arena.get_mut(old_id) {
                deletions.push(Deletion {
                    fiber: old_id,
                    prior: old_fiber.effect,
                });
                old_fiber.effect = EffectTag::Deletion;
                log::trace!(
                    target: "reconciler.reconcile",
                    "delete {} at {index}",
                    old_fiber.kind.label()
                );
            }
        }

        if let Some(fiber) = fiber {
            log::trace!(
                target: "reconciler.reconcile",
                "{:?} {} at {index}",
                fiber.effect,
                fiber.kind.label()
            );
            let id = arena.insert(fiber);
            let link = match previous {
                None => arena.get_mut(parent).map(|f| &mut f.child),
                Some(prev) => arena.get_mut(prev).map(|f| &mut f.sibling),
            };
            if let Some(link) = link {
                *link = Some(id);
            }
            previous = Some(id);
        }

        old = next_old;
        index += 1;
    }
    Ok(())
}
