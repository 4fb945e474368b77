//! Core types for spark-dom.
//!
//! These types are shared by every layer: the node tree, the live document
//! backends, the event registry and the reconciler.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// NodeId - Handle to a live node
// =============================================================================

/// Opaque handle to a node in a live document.
///
/// Handles are never reused by the bundled backends, so comparing two
/// handles is an identity check on the live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a handle from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value backing this handle.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

// =============================================================================
// Event Kinds
// =============================================================================

/// The fixed set of event kinds the framework understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    /// Derived from two timed clicks, never from a native `dblclick`.
    DoubleClick,
    KeyDown,
    KeyUp,
    Input,
    Change,
    Scroll,
    Focus,
    Blur,
    Submit,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 10] = [
        Self::Click,
        Self::DoubleClick,
        Self::KeyDown,
        Self::KeyUp,
        Self::Input,
        Self::Change,
        Self::Scroll,
        Self::Focus,
        Self::Blur,
        Self::Submit,
    ];

    /// DOM event name (`"click"`, `"dblclick"`, `"keydown"`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "dblclick",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::Input => "input",
            Self::Change => "change",
            Self::Scroll => "scroll",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Submit => "submit",
        }
    }

    /// Parse a DOM event name. Accepts `"doubleclick"` as an alias of `"dblclick"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name == "doubleclick" {
            return Some(Self::DoubleClick);
        }
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether the browser bubbles this kind. `focus`, `blur` and element
    /// `scroll` only reach ancestors in the capture phase.
    pub const fn bubbles(self) -> bool {
        !matches!(self, Self::Scroll | Self::Focus | Self::Blur)
    }

    /// Attribute that marks a node as the owner of a delegated handler.
    ///
    /// `EventKind::Click.marker()` is `"data-onclick"`.
    pub fn marker(self) -> String {
        format!("data-on{}", self.name())
    }

    /// This kind as a single-member [`EventKinds`] set.
    pub const fn flag(self) -> EventKinds {
        match self {
            Self::Click => EventKinds::CLICK,
            Self::DoubleClick => EventKinds::DOUBLE_CLICK,
            Self::KeyDown => EventKinds::KEY_DOWN,
            Self::KeyUp => EventKinds::KEY_UP,
            Self::Input => EventKinds::INPUT,
            Self::Change => EventKinds::CHANGE,
            Self::Scroll => EventKinds::SCROLL,
            Self::Focus => EventKinds::FOCUS,
            Self::Blur => EventKinds::BLUR,
            Self::Submit => EventKinds::SUBMIT,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags::bitflags! {
    /// A set of event kinds.
    ///
    /// Combine with bitwise OR: `EventKinds::CLICK | EventKinds::KEY_DOWN`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventKinds: u16 {
        const CLICK = 1 << 0;
        const DOUBLE_CLICK = 1 << 1;
        const KEY_DOWN = 1 << 2;
        const KEY_UP = 1 << 3;
        const INPUT = 1 << 4;
        const CHANGE = 1 << 5;
        const SCROLL = 1 << 6;
        const FOCUS = 1 << 7;
        const BLUR = 1 << 8;
        const SUBMIT = 1 << 9;
    }
}

impl EventKinds {
    /// Iterate the kinds contained in this set.
    pub fn kinds(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(kind.flag()))
    }
}

impl From<EventKind> for EventKinds {
    fn from(kind: EventKind) -> Self {
        kind.flag()
    }
}

// =============================================================================
// DomEvent - Synthetic event
// =============================================================================

/// Synthetic event handed to callbacks.
///
/// Hosts fill `value` and `checked` with a snapshot of the target at the time
/// the native event fired, so callbacks never need to borrow the document.
#[derive(Debug, Clone)]
pub struct DomEvent {
    /// Kind this event is being dispatched as.
    pub kind: EventKind,
    /// Node the native event originated from.
    pub target: NodeId,
    /// Key name for keyboard events (e.g. `"Enter"`, `"Escape"`, `"a"`).
    pub key: Option<String>,
    /// Live `value` of the target, when it has one.
    pub value: Option<String>,
    /// Live `checked` state of the target, when it has one.
    pub checked: Option<bool>,
    default_prevented: Rc<Cell<bool>>,
}

impl DomEvent {
    /// Create an event of `kind` originating at `target`.
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            key: None,
            value: None,
            checked: None,
            default_prevented: Rc::new(Cell::new(false)),
        }
    }

    /// Create a keydown event for `key`.
    pub fn key_down(target: NodeId, key: impl Into<String>) -> Self {
        Self::new(EventKind::KeyDown, target).with_key(key)
    }

    /// Set the key name.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the value snapshot.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the checked snapshot.
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Same event re-labelled as another kind.
    ///
    /// The copy shares the prevent-default flag with the original.
    pub fn as_kind(&self, kind: EventKind) -> Self {
        let mut event = self.clone();
        event.kind = kind;
        event
    }

    /// Ask the host to skip the native default action.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Whether any callback called [`prevent_default`](Self::prevent_default).
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// True when this is a keydown for `key`.
    pub fn is_key(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

// =============================================================================
// Callback
// =============================================================================

/// Shared event callback.
///
/// Equality is pointer identity: two callbacks are equal only when they are
/// clones of the same closure. The reconciler relies on this to decide
/// whether a handler must be re-registered.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&DomEvent)>);

impl Callback {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&DomEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &DomEvent) {
        (self.0)(event)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

impl<F> From<F> for Callback
where
    F: Fn(&DomEvent) + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}
