use core_types::HostHandle;
use thiserror::Error;

use crate::value::{Listener, PropValue};

/// Prefix marking a prop key as an event listener (`onClick` -> `click`).
pub const EVENT_PREFIX: &str = "on";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("unknown host node {0:?}")]
    UnknownNode(HostHandle),
    #[error("invalid tag name {0:?}")]
    InvalidTag(String),
    #[error("host node {node:?} is not a {expected} node")]
    WrongNodeKind {
        node: HostHandle,
        expected: &'static str,
    },
    #[error("appending {child:?} to {parent:?} would create a cycle")]
    CycleDetected {
        parent: HostHandle,
        child: HostHandle,
    },
    #[error("host node {0:?} already has a parent")]
    AlreadyAttached(HostHandle),
    #[error("host node {0:?} cannot have children")]
    InvalidParent(HostHandle),
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        parent: HostHandle,
        child: HostHandle,
    },
    #[error("property `{key}` cannot hold a {kind} value")]
    UnsupportedValue { key: String, kind: &'static str },
}

/// Primitives the reconciler needs from a host tree.
///
/// Node creation returns detached nodes; the tree shape only changes through
/// `append_child`/`remove_child`. Implementations must keep handles stable for
/// the lifetime of the node.
pub trait HostAdapter {
    fn create_node(&mut self, tag: &str) -> Result<HostHandle, HostError>;

    fn create_text_node(&mut self) -> Result<HostHandle, HostError>;

    fn set_property(
        &mut self,
        node: HostHandle,
        key: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn remove_property(&mut self, node: HostHandle, key: &str) -> Result<(), HostError>;

    fn add_listener(
        &mut self,
        node: HostHandle,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    fn remove_listener(
        &mut self,
        node: HostHandle,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    fn append_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: HostHandle, child: HostHandle) -> Result<(), HostError>;

    /// Drops a detached node and everything below it. The released handles
    /// are unknown afterwards.
    fn release_node(&mut self, node: HostHandle) -> Result<(), HostError>;

    /// Inclusive descendant check: a node contains itself.
    fn contains(&self, parent: HostHandle, node: HostHandle) -> bool;
}

pub fn is_event_key(key: &str) -> bool {
    key.len() > EVENT_PREFIX.len() && key.starts_with(EVENT_PREFIX)
}

/// Event name for an event prop key, lower-cased without the prefix.
pub fn event_name(key: &str) -> Option<String> {
    if !is_event_key(key) {
        return None;
    }
    Some(key[EVENT_PREFIX.len()..].to_ascii_lowercase())
}
