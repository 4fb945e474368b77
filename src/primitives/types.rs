//! Primitive types - Attributes and keys.
//!
//! Attributes are classified once, when the node is built. The reconciler
//! never sniffs attribute names or value types on the patch path.

use std::fmt;

use crate::types::{Callback, EventKind};

// =============================================================================
// Attribute Value
// =============================================================================

/// Attribute value of an element.
///
/// - `Static` is written with `setAttribute` (or as a live property for
///   `value`/`checked`).
/// - `Boolean(true)` writes an empty attribute, `Boolean(false)` writes nothing.
/// - `Handler` is registered with the event registry and marked on the live
///   node with a `data-on<kind>` attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Static(String),
    Boolean(bool),
    Handler(EventKind, Callback),
}

impl Attr {
    /// Truthiness of the value when it lands in a boolean property (`checked`).
    ///
    /// Strings follow the DOM rule: any non-empty string is true.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Static(s) => !s.is_empty(),
            Self::Boolean(b) => *b,
            Self::Handler(..) => true,
        }
    }

    /// String form used when the value lands in a string property (`value`).
    pub fn as_text(&self) -> String {
        match self {
            Self::Static(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Handler(..) => String::new(),
        }
    }
}

impl From<&str> for Attr {
    fn from(value: &str) -> Self {
        Self::Static(value.to_string())
    }
}

impl From<String> for Attr {
    fn from(value: String) -> Self {
        Self::Static(value)
    }
}

impl From<&String> for Attr {
    fn from(value: &String) -> Self {
        Self::Static(value.clone())
    }
}

impl From<bool> for Attr {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Attribute name under which a handler for `kind` is stored (`"onclick"`).
pub fn handler_name(kind: EventKind) -> String {
    format!("on{}", kind.name())
}

// =============================================================================
// Key
// =============================================================================

/// Identity of an element among its siblings across renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// Create a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

macro_rules! key_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(key: $ty) -> Self {
                    Self(key.to_string())
                }
            }
        )*
    };
}

key_from_int!(u32, u64, usize, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_truthiness() {
        assert!(Attr::from("false").truthy());
        assert!(!Attr::from("").truthy());
        assert!(Attr::from(true).truthy());
        assert!(!Attr::from(false).truthy());
    }

    #[test]
    fn test_attr_equality_uses_callback_identity() {
        let cb = Callback::new(|_| {});
        let a = Attr::Handler(EventKind::Click, cb.clone());
        let b = Attr::Handler(EventKind::Click, cb);
        let c = Attr::Handler(EventKind::Click, Callback::new(|_| {}));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_key_conversions() {
        assert_eq!(Key::from(7u64), Key::from("7"));
        assert_eq!(Key::new("a").as_str(), "a");
    }
}
