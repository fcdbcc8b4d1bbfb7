//! # host
//!
//! The host side of rendering: the adapter contract the reconciler drives,
//! the values it passes across, and an in-memory document tree that
//! implements the contract for tests, demos and fuzzing.
//!
//! - [`HostAdapter`]: node creation, property/listener binding, attachment
//! - [`PropValue`], [`Listener`], [`StyleMap`]: prop values
//! - [`Document`]: arena host tree with a mutation log and HTML serializer

mod adapter;
mod document;
mod mutation;
pub mod serialize;
pub mod style;
mod value;

pub use adapter::{EVENT_PREFIX, HostAdapter, HostError, event_name, is_event_key};
pub use core_types::HostHandle;
pub use document::Document;
pub use mutation::HostMutation;
pub use value::{HostEvent, Listener, PropValue, StyleMap, StyleValue};
