//! Reconciler - Turns node trees into live mutations.
//!
//! The engine has two jobs:
//! - **Materialize**: build a live subtree from a [`Node`](crate::primitives::Node)
//! - **Reconcile**: compare a new tree with the previous one and apply the
//!   smallest set of mutations this algorithm knows to the live tree
//!
//! # Rules
//!
//! Per (parent, index) position, or per key inside a keyed sibling group:
//!
//! ```text
//! new absent,  old present  -> remove live node
//! new present, old absent   -> materialize and insert
//! both absent               -> nothing
//! changed (tag/key/kind)    -> replace wholesale
//! both text                 -> write text if it differs
//! same tag and key          -> patch attributes, recurse into children
//! ```
//!
//! Handlers on elements are delegated: each live node with handlers gets a
//! generated id (see [`handler_id`]), a `data-on<kind>` marker and a registry
//! entry. Removing or replacing a subtree releases every entry generated for
//! it.

mod attributes;
mod reconciler;

pub use reconciler::{handler_id, Reconciler};
