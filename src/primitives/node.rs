//! Node - A description of one node in a desired tree.

use super::element::Element;
use super::types::Key;

/// A node in a desired tree: an element or a text node.
///
/// Trees are plain values. Rendering produces a fresh tree every time and the
/// reconciler compares it against the previous one.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    /// The element, if this is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    /// The text content, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Element(_) => None,
        }
    }

    /// Tag name for elements.
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(Element::tag)
    }

    /// Key for keyed elements.
    pub fn key(&self) -> Option<&Key> {
        self.as_element().and_then(Element::key_ref)
    }

    /// Children of an element, empty for text.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Element(el) => el.child_nodes(),
            Self::Text(_) => &[],
        }
    }

    /// Whether `self` and `other` need different live nodes.
    ///
    /// Text vs element, a different tag or a different key means the live
    /// node has to be replaced. Two text nodes never do; their content is
    /// patched in place.
    pub fn changed(&self, other: &Node) -> bool {
        match (self, other) {
            (Self::Text(_), Self::Text(_)) => false,
            (Self::Element(a), Self::Element(b)) => {
                a.tag() != b.tag() || a.key_ref() != b.key_ref()
            }
            _ => true,
        }
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(s) => out.push_str(s),
        Node::Element(el) => {
            for child in el.child_nodes() {
                collect_text(child, out);
            }
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_rules() {
        let a: Node = Element::new("li").key("1").into();
        let b: Node = Element::new("li").key("2").into();
        let c: Node = Element::new("div").key("1").into();
        assert!(!a.changed(&a.clone()));
        assert!(a.changed(&b));
        assert!(a.changed(&c));
        assert!(a.changed(&Node::from("li")));
        assert!(!Node::from("x").changed(&Node::from("y")));
    }

    #[test]
    fn test_changed_ignores_attributes() {
        let a: Node = Element::new("p").class("one").into();
        let b: Node = Element::new("p").class("two").into();
        assert!(!a.changed(&b));
    }

    #[test]
    fn test_text_content() {
        let node: Node = Element::new("p")
            .child("a")
            .child(Element::new("b").child("c"))
            .into();
        assert_eq!(node.text_content(), "ac");
    }
}
