//! # reconciler
//!
//! Incremental fiber reconciler: renders an [`Element`] tree into a
//! [`host::HostAdapter`] in interruptible units of work, then commits the
//! result in one pass.
//!
//! - [`element`]: immutable element descriptions and builders
//! - fibers: two generations (current, work-in-progress) in a generational
//!   arena, linked by weak `alternate` ids
//! - reconcile: positional (unkeyed) child diff producing effect tags
//! - commit: deletions, then placements and prop diffs, then promotion
//! - [`Hooks`]: `use_state`, `use_reducer`, `use_effect`
//! - [`Root`]: the scheduled render root and its public API
//!
//! ```ignore
//! let scheduler = Scheduler::new();
//! let mut doc = Document::new();
//! let container = doc.create_element("div")?;
//! let root = create_root(doc, container, &scheduler);
//! root.act(|| root.render(h("p").child("hello")))?;
//! assert_eq!(root.host().inner_html(container), "<p>hello</p>");
//! ```

mod commit;
pub mod element;
mod error;
mod fiber;
mod hooks;
mod reconcile;
mod root;
mod work;

pub use element::{Component, Element, ElementBuilder, ElementType, Props, h, text};
pub use error::{ComponentError, HookError, RenderError};
pub use fiber::{EffectTag, FiberId, FiberSummary};
pub use hooks::{Dispatch, Hooks, Reducer};
pub use root::{CommitReport, Root, RootPhase, create_root};
