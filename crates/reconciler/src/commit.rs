//! Commit phase: applies a finished generation to the host tree.
//!
//! Runs in one pass without yielding:
//! 1. deletions are removed from their nearest host ancestor and released,
//! 2. the new tree is walked depth-first, placing and updating host nodes,
//! 3. alternates are cleared and consumed state updates are drained.

use host::{HostAdapter, event_name, is_event_key};

use core_types::HostHandle;

use crate::element::Props;
use crate::error::RenderError;
use crate::fiber::{EffectTag, FiberArena, FiberId};
use crate::reconcile::Deletion;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CommitCounts {
    pub(crate) placements: usize,
    pub(crate) updates: usize,
}

pub(crate) fn commit_root<H: HostAdapter>(
    arena: &mut FiberArena,
    host: &mut H,
    root: FiberId,
    deletions: &[Deletion],
) -> Result<CommitCounts, RenderError> {
    for deletion in deletions {
        commit_deletion(arena, host, deletion.fiber)?;
    }

    let mut counts = CommitCounts::default();
    let mut cursor = arena.get(root).and_then(|f| f.child);
    while let Some(id) = cursor {
        commit_work(arena, host, id, &mut counts)?;
        cursor = arena.next_in_order(id);
    }

    settle(arena, root);
    Ok(counts)
}

fn commit_work<H: HostAdapter>(
    arena: &FiberArena,
    host: &mut H,
    id: FiberId,
    counts: &mut CommitCounts,
) -> Result<(), RenderError> {
    let Some(fiber) = arena.get(id) else {
        return Ok(());
    };
    match fiber.effect {
        EffectTag::Placement => {
            counts.placements += 1;
            let Some(node) = fiber.host else {
                return Ok(());
            };
            let parent = arena
                .nearest_host_ancestor(id)
                .ok_or_else(|| RenderError::Orphan(fiber.kind.label().to_string()))?;
            update_props(host, node, &Props::default(), &fiber.props)?;
            host.append_child(parent, node)?;
        }
        EffectTag::Update => {
            counts.updates += 1;
            let Some(node) = fiber.host else {
                return Ok(());
            };
            let previous = fiber
                .alternate
                .and_then(|alternate| arena.get(alternate))
                .map(|f| &*f.props);
            match previous {
                Some(previous) => update_props(host, node, previous, &fiber.props)?,
                None => update_props(host, node, &Props::default(), &fiber.props)?,
            }
        }
        EffectTag::None | EffectTag::Deletion => {}
    }
    Ok(())
}

fn commit_deletion<H: HostAdapter>(
    arena: &FiberArena,
    host: &mut H,
    id: FiberId,
) -> Result<(), RenderError> {
    let Some(parent) = arena.nearest_host_ancestor(id) else {
        return Ok(());
    };
    remove_host_nodes(arena, host, parent, id)
}

/// Detaches and releases the topmost host nodes of `id`'s subtree, descending
/// through fibers that own no host node.
fn remove_host_nodes<H: HostAdapter>(
    arena: &FiberArena,
    host: &mut H,
    parent: HostHandle,
    id: FiberId,
) -> Result<(), RenderError> {
    let Some(fiber) = arena.get(id) else {
        return Ok(());
    };
    match fiber.host {
        Some(node) => {
            if host.contains(parent, node) {
                host.remove_child(parent, node)?;
                host.release_node(node)?;
            }
        }
        None => {
            for child in arena.children(id) {
                remove_host_nodes(arena, host, parent, child)?;
            }
        }
    }
    Ok(())
}

/// Applies the difference between `previous` and `next` to `node`.
///
/// Order matters for listeners: a changed handler is removed before its
/// replacement is added, so a node never holds both.
pub(crate) fn update_props<H: HostAdapter>(
    host: &mut H,
    node: HostHandle,
    previous: &Props,
    next: &Props,
) -> Result<(), RenderError> {
    for (key, value) in previous.attrs().filter(|(key, _)| is_event_key(key)) {
        if next.get(key) == Some(value) {
            continue;
        }
        let listener = value.as_listener().ok_or_else(|| RenderError::NotAListener {
            key: key.to_string(),
        })?;
        host.remove_listener(node, &event(key), listener)?;
    }

    for (key, _) in previous.attrs().filter(|(key, _)| !is_event_key(key)) {
        if next.get(key).is_none() {
            host.remove_property(node, key)?;
        }
    }

    for (key, value) in next.attrs().filter(|(key, _)| !is_event_key(key)) {
        if previous.get(key) != Some(value) {
            host.set_property(node, key, value)?;
        }
    }

    for (key, value) in next.attrs().filter(|(key, _)| is_event_key(key)) {
        if previous.get(key) == Some(value) {
            continue;
        }
        let listener = value.as_listener().ok_or_else(|| RenderError::NotAListener {
            key: key.to_string(),
        })?;
        host.add_listener(node, &event(key), listener)?;
    }
    Ok(())
}

fn event(key: &str) -> String {
    event_name(key).unwrap_or_default()
}

/// Promotes the new tree: clears alternates and drains consumed updates.
fn settle(arena: &mut FiberArena, root: FiberId) {
    let mut cursor = Some(root);
    while let Some(id) = cursor {
        if let Some(fiber) = arena.get_mut(id) {
            fiber.alternate = None;
            fiber.hooks.iter_mut().for_each(|slot| slot.settle());
        }
        cursor = arena.next_in_order(id);
    }
}
