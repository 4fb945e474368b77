//! Element Primitive - Builder for element nodes.
//!
//! Building an element has no side effects. Attributes, key and children are
//! owned by the element, so a finished tree cannot be changed behind the
//! reconciler's back.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::primitives::{Element, Node};
//! use spark_dom::EventKind;
//!
//! let item: Node = Element::new("LI")
//!     .key(42u64)
//!     .class("completed")
//!     .child(Element::new("label").child("Buy milk"))
//!     .child(Element::new("button").class("destroy").on(EventKind::Click, |_| {}))
//!     .into();
//! ```

use crate::types::{Callback, EventKind};

use super::node::Node;
use super::types::{handler_name, Attr, Key};

// =============================================================================
// Element
// =============================================================================

/// An element node: lowercased tag, attributes, optional key and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    key: Option<Key>,
    attrs: Vec<(String, Attr)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element. The tag is lowercased.
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self {
            tag: tag.as_ref().to_ascii_lowercase(),
            key: None,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Set the reconciliation key.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set an attribute, replacing any previous value for `name`.
    ///
    /// The name `key` is routed to [`key`](Self::key) and never becomes an
    /// attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Attr>) -> Self {
        let name = name.into();
        let value = value.into();
        if name == "key" {
            self.key = Some(Key::new(value.as_text()));
            return self;
        }
        self.set(name, value);
        self
    }

    /// Shorthand for `attr("class", ..)`.
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class.into())
    }

    /// Shorthand for `attr("id", ..)`.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id.into())
    }

    /// Live `value` property.
    pub fn value(self, value: impl Into<String>) -> Self {
        self.attr("value", value.into())
    }

    /// Live `checked` property.
    pub fn checked(self, checked: bool) -> Self {
        self.attr("checked", checked)
    }

    /// Attach a handler for `kind`.
    pub fn on(self, kind: EventKind, handler: impl Fn(&crate::types::DomEvent) + 'static) -> Self {
        self.on_callback(kind, Callback::new(handler))
    }

    /// Attach an existing callback for `kind`.
    ///
    /// Reusing the same [`Callback`] across renders lets the reconciler skip
    /// re-registration.
    pub fn on_callback(mut self, kind: EventKind, callback: Callback) -> Self {
        self.set(handler_name(kind), Attr::Handler(kind, callback));
        self
    }

    /// Mark this element as the owner of the registry handler `id` for `kind`.
    ///
    /// Writes the `data-on<kind>` attribute; the callback itself is registered
    /// separately with [`EventRegistry::register`](crate::state::EventRegistry::register).
    pub fn delegate(self, kind: EventKind, id: impl Into<String>) -> Self {
        self.attr(kind.marker(), id.into())
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a child when present. `None` means "no node".
    pub fn child_opt(mut self, child: Option<impl Into<Node>>) -> Self {
        if let Some(child) = child {
            self.children.push(child.into());
        }
        self
    }

    /// Append every child from an iterator.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    fn set(&mut self, name: String, value: Attr) {
        match self.attrs.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Lowercased tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Reconciliation key, if any.
    pub fn key_ref(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Attributes in insertion order.
    pub fn attrs(&self) -> &[(String, Attr)] {
        &self.attrs
    }

    /// Look up one attribute.
    pub fn get_attr(&self, name: &str) -> Option<&Attr> {
        self.attrs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Children in order.
    pub fn child_nodes(&self) -> &[Node] {
        &self.children
    }
}

// =============================================================================
// Function form
// =============================================================================

/// Build an element node from a tag, attributes and children.
///
/// `None` children are dropped, matching "no node" in a child list.
///
/// ```ignore
/// let list = h("ul", [("class", "todo-list".into())], [
///     Some(h("li", [("key", "1".into())], [Some(text("A"))])),
///     None,
/// ]);
/// ```
pub fn h<A, C, N>(tag: &str, attrs: A, children: C) -> Node
where
    A: IntoIterator<Item = (N, Attr)>,
    N: Into<String>,
    C: IntoIterator<Item = Option<Node>>,
{
    let mut element = Element::new(tag);
    for (name, value) in attrs {
        element = element.attr(name, value);
    }
    element = element.children(children.into_iter().flatten());
    Node::Element(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::text;

    #[test]
    fn test_tag_is_lowercased() {
        assert_eq!(Element::new("DIV").tag(), "div");
        assert_eq!(Element::new("Section").tag(), "section");
    }

    #[test]
    fn test_key_attribute_becomes_key() {
        let el = Element::new("li").attr("key", "7").class("x");
        assert_eq!(el.key_ref(), Some(&Key::from("7")));
        assert!(el.get_attr("key").is_none());
        assert_eq!(el.attrs().len(), 1);
    }

    #[test]
    fn test_attr_replaces_previous_value() {
        let el = Element::new("a").class("one").class("two");
        assert_eq!(el.attrs().len(), 1);
        assert_eq!(el.get_attr("class"), Some(&Attr::from("two")));
    }

    #[test]
    fn test_handler_stored_under_on_name() {
        let el = Element::new("button").on(EventKind::Click, |_| {});
        assert!(matches!(
            el.get_attr("onclick"),
            Some(Attr::Handler(EventKind::Click, _))
        ));
    }

    #[test]
    fn test_delegate_writes_marker() {
        let el = Element::new("button").delegate(EventKind::Click, "remove");
        assert_eq!(el.get_attr("data-onclick"), Some(&Attr::from("remove")));
    }

    #[test]
    fn test_h_drops_absent_children() {
        let node = h(
            "ul",
            [("class", Attr::from("list"))],
            [Some(text("a")), None, Some(text("b"))],
        );
        let el = node.as_element().unwrap();
        assert_eq!(el.child_nodes().len(), 2);
        assert_eq!(el.get_attr("class"), Some(&Attr::from("list")));
    }

    #[test]
    fn test_child_opt() {
        let el = Element::new("div")
            .child_opt(None::<Node>)
            .child_opt(Some("x"));
        assert_eq!(el.child_nodes(), &[Node::Text("x".into())]);
    }
}
