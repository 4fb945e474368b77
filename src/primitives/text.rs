//! Text Primitive - Text node constructor.
//!
//! ```ignore
//! use spark_dom::primitives::{text, Element};
//!
//! let label = Element::new("label").child(text(format!("{} items", 3)));
//! ```

use super::node::Node;

/// Create a text node.
///
/// Text nodes carry no attributes, no key and no children. Their content is
/// written as-is; the backends never interpret markup in it.
pub fn text(content: impl Into<String>) -> Node {
    Node::Text(content.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_node() {
        let node = text("<b>hi</b>");
        assert_eq!(node.as_text(), Some("<b>hi</b>"));
        assert!(node.children().is_empty());
        assert!(node.key().is_none());
    }
}
