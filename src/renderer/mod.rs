//! Live Document - The mutable tree the reconciler writes to.
//!
//! The reconciler and the event registry never talk to a browser directly.
//! They go through the [`Document`] capability, which has two backends:
//!
//! - [`MemoryDocument`] - Arena-backed tree with mutation counters, used by
//!   tests and headless hosts
//! - `WebDocument` - `web-sys` backend (feature `web`)
//!
//! # Handles
//!
//! Live nodes are named by [`NodeId`]. A handle stays valid while the node is
//! attached or detached; [`Document::discard`] lets a backend forget a removed
//! subtree.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::renderer::{Document, MemoryDocument};
//!
//! let mut doc = MemoryDocument::new();
//! let root = doc.root();
//! let p = doc.create_element("p")?;
//! let t = doc.create_text("hello")?;
//! doc.append_child(p, t)?;
//! doc.append_child(root, p)?;
//! assert_eq!(doc.to_html(root), "<body><p>hello</p></body>");
//! ```

mod memory;
#[cfg(feature = "web")]
mod web;

pub use memory::{click, fire, key_down, toggle, type_text, MemoryDocument, MutationStats};
#[cfg(feature = "web")]
pub use web::{WebDocument, WebScheduler};

use crate::error::Result;
use crate::types::{Callback, EventKind, NodeId};

// =============================================================================
// Document capability
// =============================================================================

/// Mutable live document tree.
///
/// Mutations take `&mut self` and report failures as
/// [`DomError`](crate::error::DomError). Lookups are infallible and answer
/// `None` for unknown handles.
pub trait Document {
    /// Node native listeners are delegated to.
    fn root(&self) -> NodeId;

    fn create_element(&mut self, tag: &str) -> Result<NodeId>;
    fn create_text(&mut self, text: &str) -> Result<NodeId>;

    /// Append `child` as the last child of `parent`, detaching it first.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Insert `child` before `reference` (or append when `None`).
    ///
    /// A node that is already in the tree is moved, not copied.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Put `new` where `old` is under `parent`. `old` ends up detached.
    fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<()>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId>;
    fn child_count(&self, parent: NodeId) -> usize;

    /// Lowercased tag of an element, `None` for text.
    fn tag(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()>;

    /// Content of a text node.
    fn text(&self, node: NodeId) -> Option<String>;
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()>;

    /// Live `value` property of an element.
    fn value(&self, node: NodeId) -> Option<String>;
    fn set_value(&mut self, node: NodeId, value: &str) -> Result<()>;

    /// Live `checked` property of an element.
    fn checked(&self, node: NodeId) -> Option<bool>;
    fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<()>;

    /// Attach a native listener. Listeners on ancestors see bubbling events.
    fn add_listener(&mut self, node: NodeId, kind: EventKind, callback: Callback) -> Result<()>;

    /// Detach a listener previously added with the same callback.
    fn remove_listener(&mut self, node: NodeId, kind: EventKind, callback: &Callback)
    -> Result<()>;

    /// Forget a detached subtree. Backends that keep no per-node state may
    /// ignore this.
    fn discard(&mut self, _node: NodeId) {}
}

/// Walk from `node` up to the root, yielding `node` first.
pub fn ancestors<D: Document + ?Sized>(doc: &D, node: NodeId) -> Vec<NodeId> {
    let mut chain = vec![node];
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        chain.push(parent);
        current = parent;
    }
    chain
}
