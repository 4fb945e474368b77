//! Node Tree - Descriptions of the desired document.
//!
//! This module provides the building blocks of a render:
//! - [`Element`] - Element builder with attributes, key and children
//! - [`h`] - Function form taking tag, attributes and optional children
//! - [`text`] - Text node
//!
//! # Attributes
//!
//! Every attribute is an [`Attr`]: a static string, a boolean, or an event
//! handler. The classification happens here, once, so the reconciler can
//! patch by variant instead of inspecting names.
//!
//! ```ignore
//! use spark_dom::primitives::{h, text, Attr, Element};
//! use spark_dom::EventKind;
//!
//! // Builder form
//! let toggle = Element::new("input")
//!     .class("toggle")
//!     .attr("type", "checkbox")
//!     .checked(true)
//!     .on(EventKind::Change, |_| {});
//!
//! // Function form
//! let list = h("ul", [("class", Attr::from("todo-list"))], [Some(text("empty"))]);
//! ```

mod element;
mod node;
mod text;
mod types;

pub use element::{h, Element};
pub use node::Node;
pub use text::text;
pub use types::{handler_name, Attr, Key};
