//! Fiber arena.
//!
//! Both generations (current and work-in-progress) live in one generational
//! arena. `alternate` is a plain `FiberId`, so it never keeps the other
//! generation alive: once a generation is freed, lookups through a stale
//! alternate return `None`.

use std::rc::Rc;
use std::sync::Arc;

use core_types::HostHandle;
use slotmap::{SlotMap, new_key_type};

use crate::element::{Component, Element, ElementType, Props};
use crate::error::RenderError;
use crate::hooks::HookSlot;

new_key_type! {
    pub struct FiberId;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EffectTag {
    #[default]
    None,
    Placement,
    Update,
    Deletion,
}

#[derive(Clone, Debug)]
pub(crate) enum FiberKind {
    /// Implicit root; its host node is the container.
    Root,
    Host(Arc<str>),
    Text,
    Component(Component),
}

impl FiberKind {
    fn from_element(element: &Element) -> Result<Self, RenderError> {
        Ok(match element.ty() {
            ElementType::Host(tag) if tag.is_empty() => {
                return Err(RenderError::MalformedElement(
                    "host element with an empty tag".to_string(),
                ));
            }
            ElementType::Host(tag) => FiberKind::Host(Arc::clone(tag)),
            ElementType::Text => FiberKind::Text,
            ElementType::Component(component) => FiberKind::Component(component.clone()),
        })
    }

    pub(crate) fn matches(&self, ty: &ElementType) -> bool {
        match (self, ty) {
            (FiberKind::Host(a), ElementType::Host(b)) => a == b,
            (FiberKind::Text, ElementType::Text) => true,
            (FiberKind::Component(a), ElementType::Component(b)) => a.same_type(b),
            _ => false,
        }
    }

    pub(crate) fn label(&self) -> &str {
        match self {
            FiberKind::Root => "#root",
            FiberKind::Host(tag) => &**tag,
            FiberKind::Text => "#text",
            FiberKind::Component(component) => component.name(),
        }
    }
}

pub(crate) struct Fiber {
    pub(crate) kind: FiberKind,
    pub(crate) props: Rc<Props>,
    /// Set at most once; updates mutate the host node in place.
    pub(crate) host: Option<HostHandle>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: EffectTag,
    pub(crate) hooks: Vec<HookSlot>,
}

impl Fiber {
    pub(crate) fn root(
        container: HostHandle,
        props: Rc<Props>,
        alternate: Option<FiberId>,
    ) -> Self {
        Self {
            kind: FiberKind::Root,
            props,
            host: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect: EffectTag::None,
            hooks: Vec::new(),
        }
    }

    /// Fresh fiber for `element`, tagged for placement.
    pub(crate) fn placement(element: &Element, parent: FiberId) -> Result<Self, RenderError> {
        Ok(Self {
            kind: FiberKind::from_element(element)?,
            props: Rc::clone(element.props()),
            host: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect: EffectTag::Placement,
            hooks: Vec::new(),
        })
    }

    /// Fiber for `element` reusing the host node of its previous generation.
    pub(crate) fn update(
        element: &Element,
        parent: FiberId,
        alternate: FiberId,
        host: Option<HostHandle>,
    ) -> Result<Self, RenderError> {
        let mut fiber = Self::placement(element, parent)?;
        fiber.alternate = Some(alternate);
        fiber.host = host;
        fiber.effect = EffectTag::Update;
        Ok(fiber)
    }
}

/// Read-only view of one fiber, in tree order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FiberSummary {
    pub depth: usize,
    pub label: String,
    pub effect: EffectTag,
    pub host: Option<HostHandle>,
    pub hooks: usize,
}

#[derive(Default)]
pub(crate) struct FiberArena {
    fibers: SlotMap<FiberId, Fiber>,
}

impl FiberArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub(crate) fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber> {
        self.fibers.get_mut(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.fibers.len()
    }

    pub(crate) fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut cursor = self.get(id).and_then(|f| f.child);
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.get(child).and_then(|f| f.sibling);
        }
        out
    }

    /// Next fiber in depth-first order: the child, else the nearest sibling
    /// found walking up through the parents.
    pub(crate) fn next_in_order(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Host node of the nearest ancestor that owns one.
    pub(crate) fn nearest_host_ancestor(&self, id: FiberId) -> Option<HostHandle> {
        let mut cursor = self.get(id)?.parent;
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(host) = fiber.host {
                return Some(host);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Releases every fiber reachable from `root`. Host nodes are untouched.
    pub(crate) fn free_generation(&mut self, root: FiberId) -> usize {
        let mut freed = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(fiber) = self.fibers.remove(id) else {
                continue;
            };
            freed += 1;
            stack.extend(fiber.sibling.filter(|_| id != root));
            stack.extend(fiber.child);
        }
        freed
    }

    pub(crate) fn summaries(&self, root: FiberId) -> Vec<FiberSummary> {
        let mut out = Vec::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(fiber) = self.get(id) else {
                continue;
            };
            out.push(FiberSummary {
                depth,
                label: fiber.kind.label().to_string(),
                effect: fiber.effect,
                host: fiber.host,
                hooks: fiber.hooks.len(),
            });
            for child in self.children(id).into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}
