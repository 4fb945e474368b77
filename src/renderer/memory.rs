//! In-memory document.
//!
//! An arena of element and text nodes that behaves like a browser DOM for
//! everything the reconciler touches: move-on-insert, live `value` and
//! `checked` properties, bubbling listeners. Every mutation bumps a counter
//! in [`MutationStats`], so tests can assert "this update wrote nothing".
//!
//! # API
//!
//! - [`MemoryDocument::new`] - Empty document with a `<body>` root
//! - [`MemoryDocument::stats`] / [`reset_stats`](MemoryDocument::reset_stats)
//! - [`MemoryDocument::to_html`] - Serialize a subtree
//! - [`MemoryDocument::query_class`] / [`query_tag`](MemoryDocument::query_tag)
//! - [`fire`], [`click`], [`key_down`], [`type_text`], [`toggle`] - Simulate
//!   native events on a shared document

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use super::{ancestors, Document};
use crate::error::{DomError, Result};
use crate::types::{Callback, DomEvent, EventKind, NodeId};

// =============================================================================
// Mutation counters
// =============================================================================

/// Counts of live mutations since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub created: usize,
    pub inserted: usize,
    pub removed: usize,
    pub replaced: usize,
    pub attribute_writes: usize,
    pub attribute_removals: usize,
    pub text_writes: usize,
    pub value_writes: usize,
    pub checked_writes: usize,
    pub listeners_added: usize,
    pub listeners_removed: usize,
}

impl MutationStats {
    /// Total number of mutations.
    pub fn total(&self) -> usize {
        self.created
            + self.inserted
            + self.removed
            + self.replaced
            + self.attribute_writes
            + self.attribute_removals
            + self.text_writes
            + self.value_writes
            + self.checked_writes
            + self.listeners_added
            + self.listeners_removed
    }

    /// True when nothing was written.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Debug)]
enum Content {
    Element { tag: String, attrs: Vec<(String, String)>, value: String, checked: bool },
    Text(String),
}

struct Slot {
    content: Content,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(EventKind, Callback)>,
}

impl Slot {
    fn new(content: Content) -> Self {
        Self { content, parent: None, children: Vec::new(), listeners: Vec::new() }
    }
}

/// Arena-backed [`Document`].
pub struct MemoryDocument {
    nodes: HashMap<NodeId, Slot>,
    next_id: u64,
    root: NodeId,
    stats: MutationStats,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document whose root is an empty `<body>`.
    pub fn new() -> Self {
        let root = NodeId::new(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Slot::new(Content::Element {
                tag: "body".to_string(),
                attrs: Vec::new(),
                value: String::new(),
                checked: false,
            }),
        );
        Self { nodes, next_id: 2, root, stats: MutationStats::default() }
    }

    /// Mutation counters since creation or the last reset.
    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    /// Number of nodes held by the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `node` is still held by the arena.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Child handles of `node`, in order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.get(&node).map(|slot| slot.children.clone()).unwrap_or_default()
    }

    /// Number of listeners attached to `node` for `kind`.
    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.nodes
            .get(&node)
            .map(|slot| slot.listeners.iter().filter(|(k, _)| *k == kind).count())
            .unwrap_or(0)
    }

    /// Set the live value the way a user typing would. Not counted as a
    /// mutation.
    pub fn user_set_value(&mut self, node: NodeId, text: &str) -> Result<()> {
        match &mut self.slot_mut(node)?.content {
            Content::Element { value, .. } => {
                *value = text.to_string();
                Ok(())
            }
            Content::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    /// Flip the live checked state the way a user click would. Not counted.
    pub fn user_toggle(&mut self, node: NodeId) -> Result<bool> {
        match &mut self.slot_mut(node)?.content {
            Content::Element { checked, .. } => {
                *checked = !*checked;
                Ok(*checked)
            }
            Content::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Concatenated text of a subtree.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(slot) = self.nodes.get(&node) else { return };
        match &slot.content {
            Content::Text(text) => out.push_str(text),
            Content::Element { .. } => {
                for child in &slot.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Descendants of the root, in document order, whose `class` contains
    /// the token `class`.
    pub fn query_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| {
                self.attribute(*id, "class")
                    .is_some_and(|value| value.split_whitespace().any(|token| token == class))
            })
            .collect()
    }

    /// First descendant of the root carrying class `class`.
    pub fn find_class(&self, class: &str) -> Option<NodeId> {
        self.query_class(class).into_iter().next()
    }

    /// Descendants of the root with tag `tag`, in document order.
    pub fn query_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.tag(*id).as_deref() == Some(tag))
            .collect()
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    /// Serialize a subtree as HTML. Attributes keep insertion order; live
    /// properties are not serialized.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(slot) = self.nodes.get(&node) else { return };
        match &slot.content {
            Content::Text(text) => out.push_str(&escape(text, false)),
            Content::Element { tag, attrs, .. } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape(value, true));
                        out.push('"');
                    }
                }
                out.push('>');
                for child in &slot.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn slot(&self, node: NodeId) -> Result<&Slot> {
        self.nodes.get(&node).ok_or(DomError::UnknownNode(node))
    }

    fn slot_mut(&mut self, node: NodeId) -> Result<&mut Slot> {
        self.nodes.get_mut(&node).ok_or(DomError::UnknownNode(node))
    }

    fn element_mut(&mut self, node: NodeId) -> Result<ElementMut<'_>> {
        match &mut self.slot_mut(node)?.content {
            Content::Element { attrs, value, checked, .. } => Ok(ElementMut { attrs, value, checked }),
            Content::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    fn alloc(&mut self, content: Content) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Slot::new(content));
        self.stats.created += 1;
        id
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        ancestors(self, node).contains(&candidate)
    }

    fn detach(&mut self, child: NodeId) -> Result<()> {
        let parent = self.slot(child)?.parent;
        if let Some(parent) = parent {
            let slot = self.slot_mut(parent)?;
            slot.children.retain(|id| *id != child);
            self.slot_mut(child)?.parent = None;
        }
        Ok(())
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.slot(parent)?
            .children
            .iter()
            .position(|id| *id == child)
            .ok_or(DomError::NotAChild { parent, child })
    }
}

struct ElementMut<'a> {
    attrs: &'a mut Vec<(String, String)>,
    value: &'a mut String,
    checked: &'a mut bool,
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// Document impl
// =============================================================================

impl Document for MemoryDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        Ok(self.alloc(Content::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            value: String::new(),
            checked: false,
        }))
    }

    fn create_text(&mut self, text: &str) -> Result<NodeId> {
        Ok(self.alloc(Content::Text(text.to_string())))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        if let Content::Text(_) = self.slot(parent)?.content {
            return Err(DomError::NotAnElement(parent));
        }
        self.slot(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::Hierarchy { parent, child });
        }
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(reference) = reference {
            self.position(parent, reference)?;
        }

        self.detach(child)?;
        let index = match reference {
            Some(reference) => self.position(parent, reference)?,
            None => self.slot(parent)?.children.len(),
        };
        self.slot_mut(parent)?.children.insert(index, child);
        self.slot_mut(child)?.parent = Some(parent);
        self.stats.inserted += 1;
        trace!(%parent, %child, index, "insert");
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.position(parent, child)?;
        self.detach(child)?;
        self.stats.removed += 1;
        Ok(())
    }

    fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<()> {
        if new == old {
            return Ok(());
        }
        self.position(parent, old)?;
        self.slot(new)?;
        if self.is_ancestor_or_self(new, parent) {
            return Err(DomError::Hierarchy { parent, child: new });
        }
        self.detach(new)?;
        let index = self.position(parent, old)?;
        self.slot_mut(parent)?.children[index] = new;
        self.slot_mut(old)?.parent = None;
        self.slot_mut(new)?.parent = Some(parent);
        self.stats.replaced += 1;
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|slot| slot.parent)
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.nodes.get(&parent).and_then(|slot| slot.children.get(index).copied())
    }

    fn child_count(&self, parent: NodeId) -> usize {
        self.nodes.get(&parent).map_or(0, |slot| slot.children.len())
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        match &self.nodes.get(&node)?.content {
            Content::Element { tag, .. } => Some(tag.clone()),
            Content::Text(_) => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes.get(&node)?.content {
            Content::Element { attrs, .. } => {
                attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
            }
            Content::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let el = self.element_mut(node)?;
        match el.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => el.attrs.push((name.to_string(), value.to_string())),
        }
        self.stats.attribute_writes += 1;
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        let el = self.element_mut(node)?;
        el.attrs.retain(|(n, _)| n != name);
        self.stats.attribute_removals += 1;
        Ok(())
    }

    fn text(&self, node: NodeId) -> Option<String> {
        match &self.nodes.get(&node)?.content {
            Content::Text(text) => Some(text.clone()),
            Content::Element { .. } => None,
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        match &mut self.slot_mut(node)?.content {
            Content::Text(current) => *current = text.to_string(),
            Content::Element { .. } => return Err(DomError::NotText(node)),
        }
        self.stats.text_writes += 1;
        Ok(())
    }

    fn value(&self, node: NodeId) -> Option<String> {
        match &self.nodes.get(&node)?.content {
            Content::Element { value, .. } => Some(value.clone()),
            Content::Text(_) => None,
        }
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        *self.element_mut(node)?.value = value.to_string();
        self.stats.value_writes += 1;
        Ok(())
    }

    fn checked(&self, node: NodeId) -> Option<bool> {
        match &self.nodes.get(&node)?.content {
            Content::Element { checked, .. } => Some(*checked),
            Content::Text(_) => None,
        }
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<()> {
        *self.element_mut(node)?.checked = checked;
        self.stats.checked_writes += 1;
        Ok(())
    }

    fn add_listener(&mut self, node: NodeId, kind: EventKind, callback: Callback) -> Result<()> {
        self.slot_mut(node)?.listeners.push((kind, callback));
        self.stats.listeners_added += 1;
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: NodeId,
        kind: EventKind,
        callback: &Callback,
    ) -> Result<()> {
        let slot = self.slot_mut(node)?;
        let before = slot.listeners.len();
        slot.listeners.retain(|(k, cb)| !(*k == kind && cb.ptr_eq(callback)));
        if slot.listeners.len() != before {
            self.stats.listeners_removed += 1;
        }
        Ok(())
    }

    fn discard(&mut self, node: NodeId) {
        if node == self.root || self.parent(node).is_some() {
            return;
        }
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(slot) = self.nodes.remove(&id) {
                stack.extend(slot.children);
            }
        }
    }
}

// =============================================================================
// Simulated native events
// =============================================================================

/// Fire a native event at `event.target` and let it bubble to the root.
///
/// Listeners are collected first and the document borrow is released before
/// any of them runs, so listeners may borrow the document themselves.
/// Returns whether a listener called `prevent_default`.
pub fn fire(doc: &Rc<RefCell<MemoryDocument>>, mut event: DomEvent) -> bool {
    let listeners: Vec<Callback> = {
        let doc = doc.borrow();
        if !doc.contains(event.target) {
            return false;
        }
        if event.value.is_none() && is_form_control(&doc, event.target) {
            event.value = doc.value(event.target);
        }
        if event.checked.is_none() && doc.tag(event.target).as_deref() == Some("input") {
            event.checked = doc.checked(event.target);
        }
        ancestors(&*doc, event.target)
            .into_iter()
            .filter_map(|id| doc.nodes.get(&id))
            .flat_map(|slot| {
                slot.listeners
                    .iter()
                    .filter(|(kind, _)| *kind == event.kind)
                    .map(|(_, cb)| cb.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    };

    for listener in listeners {
        listener.call(&event);
    }
    event.default_prevented()
}

fn is_form_control(doc: &MemoryDocument, node: NodeId) -> bool {
    matches!(doc.tag(node).as_deref(), Some("input" | "textarea" | "select"))
}

/// Fire a native click.
pub fn click(doc: &Rc<RefCell<MemoryDocument>>, target: NodeId) -> bool {
    fire(doc, DomEvent::new(EventKind::Click, target))
}

/// Fire a native keydown for `key`.
pub fn key_down(doc: &Rc<RefCell<MemoryDocument>>, target: NodeId, key: &str) -> bool {
    fire(doc, DomEvent::key_down(target, key))
}

/// Replace the live value of `target` and fire `input`.
pub fn type_text(doc: &Rc<RefCell<MemoryDocument>>, target: NodeId, text: &str) -> Result<bool> {
    doc.borrow_mut().user_set_value(target, text)?;
    Ok(fire(doc, DomEvent::new(EventKind::Input, target)))
}

/// Flip the checked state of `target` and fire `change`.
pub fn toggle(doc: &Rc<RefCell<MemoryDocument>>, target: NodeId) -> Result<bool> {
    doc.borrow_mut().user_toggle(target)?;
    Ok(fire(doc, DomEvent::new(EventKind::Change, target)))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn el(doc: &mut MemoryDocument, tag: &str) -> NodeId {
        doc.create_element(tag).unwrap()
    }

    #[test]
    fn test_append_and_serialize() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let ul = el(&mut doc, "UL");
        let li = el(&mut doc, "li");
        let t = doc.create_text("a < b").unwrap();
        doc.set_attribute(ul, "class", "todo-list").unwrap();
        doc.set_attribute(li, "hidden", "").unwrap();
        doc.append_child(li, t).unwrap();
        doc.append_child(ul, li).unwrap();
        doc.append_child(root, ul).unwrap();

        assert_eq!(
            doc.to_html(root),
            "<body><ul class=\"todo-list\"><li hidden>a &lt; b</li></ul></body>"
        );
        assert_eq!(doc.text_content(root), "a < b");
        assert_eq!(doc.query_class("todo-list"), vec![ul]);
        assert_eq!(doc.query_tag("li"), vec![li]);
    }

    #[test]
    fn test_insert_before_moves_node() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let a = el(&mut doc, "a");
        let b = el(&mut doc, "b");
        let c = el(&mut doc, "i");
        for id in [a, b, c] {
            doc.append_child(root, id).unwrap();
        }
        doc.reset_stats();

        doc.insert_before(root, c, Some(a)).unwrap();
        assert_eq!(doc.children(root), vec![c, a, b]);
        assert_eq!(doc.stats().inserted, 1);
        assert_eq!(doc.stats().created, 0);
    }

    #[test]
    fn test_hierarchy_and_missing_child_errors() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let outer = el(&mut doc, "div");
        let inner = el(&mut doc, "div");
        doc.append_child(root, outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        assert_eq!(
            doc.append_child(inner, outer),
            Err(DomError::Hierarchy { parent: inner, child: outer })
        );
        assert_eq!(
            doc.remove_child(root, inner),
            Err(DomError::NotAChild { parent: root, child: inner })
        );
        let text = doc.create_text("x").unwrap();
        assert_eq!(doc.append_child(text, inner), Err(DomError::NotAnElement(text)));
    }

    #[test]
    fn test_replace_child_detaches_old() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let old = el(&mut doc, "p");
        let new = el(&mut doc, "div");
        doc.append_child(root, old).unwrap();
        doc.replace_child(root, new, old).unwrap();
        assert_eq!(doc.children(root), vec![new]);
        assert_eq!(doc.parent(old), None);

        doc.discard(old);
        assert!(!doc.contains(old));
    }

    #[test]
    fn test_fire_bubbles_and_snapshots_value() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let (root, input) = {
            let mut d = doc.borrow_mut();
            let root = d.root();
            let input = d.create_element("input").unwrap();
            d.append_child(root, input).unwrap();
            (root, input)
        };

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let doc_clone = doc.clone();
        doc.borrow_mut()
            .add_listener(
                root,
                EventKind::Input,
                Callback::new(move |e| {
                    // The document is not borrowed while listeners run.
                    let _ = doc_clone.borrow_mut();
                    seen_clone.borrow_mut().push(e.value.clone());
                }),
            )
            .unwrap();

        type_text(&doc, input, "milk").unwrap();
        assert_eq!(*seen.borrow(), vec![Some("milk".to_string())]);
        assert_eq!(doc.borrow().stats().value_writes, 0);
    }

    #[test]
    fn test_remove_listener_by_identity() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let root = doc.borrow().root();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        let cb = Callback::new(move |_| hits_clone.set(hits_clone.get() + 1));

        doc.borrow_mut().add_listener(root, EventKind::Click, cb.clone()).unwrap();
        click(&doc, root);
        doc.borrow_mut().remove_listener(root, EventKind::Click, &cb).unwrap();
        click(&doc, root);

        assert_eq!(hits.get(), 1);
        assert_eq!(doc.borrow().listener_count(root, EventKind::Click), 0);
    }

    #[test]
    fn test_prevent_default_reported() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let root = doc.borrow().root();
        doc.borrow_mut()
            .add_listener(root, EventKind::Click, Callback::new(|e| e.prevent_default()))
            .unwrap();
        assert!(click(&doc, root));
        assert!(!key_down(&doc, root, "Enter"));
    }
}
