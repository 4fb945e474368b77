//! Error type for live document operations.

use thiserror::Error;

use crate::types::NodeId;

/// Failure reported by a [`Document`](crate::renderer::Document) backend.
///
/// The reconciler never produces these on its own; it only propagates what
/// the backend reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The handle does not name a node in this document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    /// An element operation was applied to a text node.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    /// A text operation was applied to an element.
    #[error("node {0} is not a text node")]
    NotText(NodeId),
    /// `child` is not currently a child of `parent`.
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    /// Inserting the node would make it its own ancestor.
    #[error("cannot insert {child} under {parent}: hierarchy request")]
    Hierarchy { parent: NodeId, child: NodeId },
    /// The document is already borrowed by a pass further up the stack.
    #[error("document is busy")]
    Busy,
    /// The browser DOM is not reachable (no window or document).
    #[error("DOM is not available")]
    DomUnavailable,
    /// No element carries the requested id.
    #[error("failed to find DOM element with id `{0}`")]
    RootNotFound(String),
    /// Exception raised by the browser.
    #[error("JavaScript error: {0}")]
    Js(String),
}

/// Result alias used across the crate.
pub type Result<T, E = DomError> = std::result::Result<T, E>;
