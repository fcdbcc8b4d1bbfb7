//! Host mutation log.
//!
//! Every primitive a `Document` applies is recorded here while recording is
//! enabled, in application order. Tests use the log to observe exactly what a
//! commit touched.
//!
//! Invariants:
//! - Entries are appended in the order the primitives were applied.
//! - Handles referenced by an entry were live when it was applied.
//! - Node creation is logged even though it does not attach anything; only
//!   `AppendChild`/`RemoveChild` change the tree shape.

use core_types::HostHandle;
use std::sync::Arc;

use crate::value::PropValue;

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum HostMutation {
    CreateElement { node: HostHandle, tag: Arc<str> },
    CreateText { node: HostHandle },
    SetProperty {
        node: HostHandle,
        key: Arc<str>,
        value: PropValue,
    },
    RemoveProperty { node: HostHandle, key: Arc<str> },
    AddListener { node: HostHandle, event: Arc<str> },
    RemoveListener { node: HostHandle, event: Arc<str> },
    AppendChild { parent: HostHandle, child: HostHandle },
    RemoveChild { parent: HostHandle, child: HostHandle },
    ReleaseNode { node: HostHandle },
}

impl HostMutation {
    /// The node whose own state or child list changed.
    pub fn node(&self) -> HostHandle {
        match self {
            HostMutation::CreateElement { node, .. }
            | HostMutation::CreateText { node }
            | HostMutation::SetProperty { node, .. }
            | HostMutation::RemoveProperty { node, .. }
            | HostMutation::AddListener { node, .. }
            | HostMutation::RemoveListener { node, .. }
            | HostMutation::ReleaseNode { node } => *node,
            HostMutation::AppendChild { parent, .. } | HostMutation::RemoveChild { parent, .. } => {
                *parent
            }
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            HostMutation::AppendChild { .. } | HostMutation::RemoveChild { .. }
        )
    }

    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            HostMutation::CreateElement { .. } | HostMutation::CreateText { .. }
        )
    }
}
