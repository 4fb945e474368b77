use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::primitives::{Element, Key, Node};
use crate::renderer::Document;
use crate::state::EventRegistry;
use crate::types::{EventKind, NodeId};

/// Registry id generated for the handlers of live node `live`.
pub fn handler_id(live: NodeId) -> String {
    format!("__{live}")
}

// =============================================================================
// Reconciler
// =============================================================================

/// One reconciliation pass over a borrowed document.
///
/// The registry is only used for handler bookkeeping; it is never asked to
/// dispatch during a pass.
pub struct Reconciler<'a, D: Document + 'static> {
    pub(super) doc: &'a mut D,
    pub(super) registry: &'a EventRegistry<D>,
}

impl<'a, D: Document + 'static> Reconciler<'a, D> {
    pub fn new(doc: &'a mut D, registry: &'a EventRegistry<D>) -> Self {
        Self { doc, registry }
    }

    // -------------------------------------------------------------------------
    // Materialization
    // -------------------------------------------------------------------------

    /// Build a detached live subtree for `node`.
    pub fn materialize(&mut self, node: &Node) -> Result<NodeId> {
        match node {
            Node::Text(text) => self.doc.create_text(text),
            Node::Element(el) => {
                let live = self.doc.create_element(el.tag())?;
                for (name, value) in el.attrs() {
                    self.apply_attribute(live, name, value, None)?;
                }
                for child in el.child_nodes() {
                    let child_live = self.materialize(child)?;
                    self.doc.append_child(live, child_live)?;
                }
                trace!(%live, tag = el.tag(), "materialize");
                Ok(live)
            }
        }
    }

    /// Materialize `node` and append it under `parent`.
    pub fn mount(&mut self, parent: NodeId, node: &Node) -> Result<NodeId> {
        let live = self.materialize(node)?;
        self.doc.append_child(parent, live)?;
        Ok(live)
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    /// Reconcile the child of `parent` at `index`.
    ///
    /// A live node missing where the old tree says one should be degrades to
    /// an append (for insertions) or a no-op (for removals).
    pub fn reconcile(
        &mut self,
        parent: NodeId,
        new: Option<&Node>,
        old: Option<&Node>,
        index: usize,
    ) -> Result<()> {
        match (new, old) {
            (None, None) => Ok(()),
            (Some(new), None) => {
                let live = self.materialize(new)?;
                let reference = self.doc.child_at(parent, index);
                trace!(%parent, index, "insert");
                self.doc.insert_before(parent, live, reference)
            }
            (None, Some(_)) => match self.doc.child_at(parent, index) {
                Some(live) => self.remove(parent, live),
                None => Ok(()),
            },
            (Some(new), Some(old)) => match self.doc.child_at(parent, index) {
                Some(live) => self.patch(parent, live, new, old).map(|_| ()),
                None => {
                    let live = self.materialize(new)?;
                    self.doc.append_child(parent, live)
                }
            },
        }
    }

    /// Bring the live node `live` (currently showing `old`) in line with `new`.
    ///
    /// Returns the live node now showing `new`: `live` itself, or its
    /// replacement.
    pub fn patch(&mut self, parent: NodeId, live: NodeId, new: &Node, old: &Node) -> Result<NodeId> {
        match (new, old) {
            (Node::Text(new_text), Node::Text(old_text)) => {
                if new_text != old_text {
                    trace!(%live, "text");
                    self.doc.set_text(live, new_text)?;
                }
                Ok(live)
            }
            (Node::Element(new_el), Node::Element(old_el)) if !new.changed(old) => {
                self.patch_attributes(live, new_el, old_el)?;
                self.reconcile_children(live, new_el, old_el)?;
                Ok(live)
            }
            _ => {
                let fresh = self.materialize(new)?;
                trace!(%parent, old = %live, new = %fresh, "replace");
                self.doc.replace_child(parent, fresh, live)?;
                self.release(live);
                self.doc.discard(live);
                Ok(fresh)
            }
        }
    }

    /// Detach `live` from `parent` and release its handlers.
    pub fn remove(&mut self, parent: NodeId, live: NodeId) -> Result<()> {
        trace!(%parent, %live, "remove");
        self.doc.remove_child(parent, live)?;
        self.release(live);
        self.doc.discard(live);
        Ok(())
    }

    /// Unregister every handler generated for the live subtree at `live`.
    pub fn release(&mut self, live: NodeId) {
        let mut stack = vec![live];
        while let Some(node) = stack.pop() {
            let id = handler_id(node);
            for kind in EventKind::ALL {
                if self.doc.attribute(node, &kind.marker()).as_deref() != Some(id.as_str()) {
                    continue;
                }
                if let Some(listener) = self.registry.take_direct_listener(kind, &id) {
                    if let Err(err) = self.doc.remove_listener(node, kind, &listener) {
                        debug!(%node, %kind, error = %err, "direct listener already gone");
                    }
                }
                self.registry.unregister(kind, &id);
            }
            let count = self.doc.child_count(node);
            stack.extend((0..count).filter_map(|i| self.doc.child_at(node, i)));
        }
    }

    // -------------------------------------------------------------------------
    // Children
    // -------------------------------------------------------------------------

    fn reconcile_children(&mut self, live: NodeId, new: &Element, old: &Element) -> Result<()> {
        let new_children = new.child_nodes();
        let old_children = old.child_nodes();
        let keyed = new_children
            .iter()
            .chain(old_children)
            .any(|child| child.key().is_some());
        if keyed {
            self.reconcile_keyed(live, new_children, old_children)
        } else {
            self.reconcile_indexed(live, new_children, old_children)
        }
    }

    fn reconcile_indexed(&mut self, parent: NodeId, new: &[Node], old: &[Node]) -> Result<()> {
        let common = new.len().min(old.len());
        for i in 0..common {
            self.reconcile(parent, Some(&new[i]), Some(&old[i]), i)?;
        }
        for (i, child) in new.iter().enumerate().skip(common) {
            self.reconcile(parent, Some(child), None, i)?;
        }
        for i in (new.len()..old.len()).rev() {
            self.reconcile(parent, None, Some(&old[i]), i)?;
        }
        Ok(())
    }

    fn reconcile_keyed(&mut self, parent: NodeId, new: &[Node], old: &[Node]) -> Result<()> {
        let old_live: Vec<NodeId> = (0..old.len())
            .filter_map(|i| self.doc.child_at(parent, i))
            .collect();

        // Keyed old children by key; unkeyed ones in order, matched by
        // position among themselves.
        let mut by_key: HashMap<&Key, (NodeId, &Node)> = HashMap::new();
        let mut unkeyed: Vec<(NodeId, &Node)> = Vec::new();
        for (child, live) in old.iter().zip(&old_live) {
            match child.key() {
                Some(key) => {
                    if by_key.insert(key, (*live, child)).is_some() {
                        warn!(%parent, %key, "duplicate key among siblings");
                    }
                }
                None => unkeyed.push((*live, child)),
            }
        }

        let mut reused: HashSet<NodeId> = HashSet::new();
        let mut targets: Vec<NodeId> = Vec::with_capacity(new.len());
        let mut cursor = 0;
        for child in new {
            let hit = match child.key() {
                Some(key) => by_key
                    .get(key)
                    .filter(|(live, old_child)| !reused.contains(live) && old_child.tag() == child.tag())
                    .copied(),
                None => {
                    let found = unkeyed[cursor..]
                        .iter()
                        .position(|(_, old_child)| old_child.tag() == child.tag());
                    found.map(|offset| {
                        cursor += offset + 1;
                        unkeyed[cursor - 1]
                    })
                }
            };
            let target = match hit {
                Some((live, old_child)) => {
                    reused.insert(live);
                    self.patch(parent, live, child, old_child)?
                }
                None => self.materialize(child)?,
            };
            targets.push(target);
        }

        for live in old_live {
            if !reused.contains(&live) {
                self.remove(parent, live)?;
            }
        }

        for (index, target) in targets.iter().enumerate() {
            let current = self.doc.child_at(parent, index);
            if current != Some(*target) {
                trace!(%parent, index, node = %target, "move");
                self.doc.insert_before(parent, *target, current)?;
            }
        }

        while let Some(surplus) = self.doc.child_at(parent, targets.len()) {
            self.remove(parent, surplus)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::primitives::{h, text, Attr};
    use crate::renderer::MemoryDocument;
    use crate::state::ManualScheduler;

    struct Harness {
        doc: Rc<RefCell<MemoryDocument>>,
        registry: EventRegistry<MemoryDocument>,
    }

    impl Harness {
        fn new() -> Self {
            let doc = Rc::new(RefCell::new(MemoryDocument::new()));
            let registry = EventRegistry::new(doc.clone(), Rc::new(ManualScheduler::new()));
            Self { doc, registry }
        }

        fn mount(&self, node: &Node) -> NodeId {
            let mut doc = self.doc.borrow_mut();
            let root = doc.root();
            Reconciler::new(&mut *doc, &self.registry).mount(root, node).unwrap()
        }

        fn update(&self, new: &Node, old: &Node) {
            let mut doc = self.doc.borrow_mut();
            let root = doc.root();
            Reconciler::new(&mut *doc, &self.registry)
                .reconcile(root, Some(new), Some(old), 0)
                .unwrap();
        }

        fn html(&self) -> String {
            let doc = self.doc.borrow();
            doc.to_html(doc.root())
        }

        fn reset(&self) {
            self.doc.borrow_mut().reset_stats();
        }
    }

    fn list(keys: &[&str]) -> Node {
        Element::new("ul")
            .children(keys.iter().map(|k| Element::new("li").key(*k).child(k.to_uppercase())))
            .into()
    }

    fn plain(items: &[&str]) -> Node {
        Element::new("ul")
            .children(items.iter().map(|t| Element::new("li").child(*t)))
            .into()
    }

    #[test]
    fn test_round_trip_matches_fresh_render() {
        let a = h(
            "div",
            [("class", Attr::from("app"))],
            [Some(text("A")), Some(Element::new("p").class("x").into())],
        );
        let b = h(
            "div",
            [("id", Attr::from("main"))],
            [Some(Element::new("span").into()), None, Some(text("B")), Some(text("C"))],
        );

        let fresh = Harness::new();
        fresh.mount(&a);

        let h2 = Harness::new();
        h2.mount(&a);
        h2.update(&b, &a);
        h2.update(&a, &b);

        assert_eq!(h2.html(), fresh.html());
    }

    #[test]
    fn test_identical_tree_writes_nothing() {
        let hx = Harness::new();
        let a: Node = Element::new("section")
            .class("main")
            .child(list(&["1", "2", "3"]))
            .child(Element::new("input").value("x").checked(true))
            .child(Element::new("button").on(EventKind::Click, |_| {}))
            .into();
        hx.mount(&a);
        hx.reset();

        hx.update(&a.clone(), &a);
        assert!(hx.doc.borrow().stats().is_empty());
    }

    #[test]
    fn test_keyed_reorder_preserves_identity() {
        let hx = Harness::new();
        let old = list(&["k1", "k2", "k3"]);
        let ul = hx.mount(&old);
        let before = hx.doc.borrow().children(ul);
        hx.reset();

        hx.update(&list(&["k3", "k1", "k2"]), &old);

        let after = hx.doc.borrow().children(ul);
        assert_eq!(after, vec![before[2], before[0], before[1]]);
        let stats = hx.doc.borrow().stats();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.inserted, 1);
        assert_eq!(hx.doc.borrow().text_content(ul), "K3K1K2");
    }

    #[test]
    fn test_keyed_removal_keeps_survivors() {
        let hx = Harness::new();
        let old = list(&["k1", "k2", "k3"]);
        let ul = hx.mount(&old);
        let before = hx.doc.borrow().children(ul);

        hx.update(&list(&["k1", "k3"]), &old);

        let after = hx.doc.borrow().children(ul);
        assert_eq!(after, vec![before[0], before[2]]);
        assert!(!hx.doc.borrow().contains(before[1]));
    }

    #[test]
    fn test_keyed_insert_in_middle() {
        let hx = Harness::new();
        let old = list(&["a", "c"]);
        let ul = hx.mount(&old);
        let before = hx.doc.borrow().children(ul);

        hx.update(&list(&["a", "b", "c"]), &old);

        let after = hx.doc.borrow().children(ul);
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[1]);
        assert_eq!(hx.doc.borrow().text_content(ul), "ABC");
    }

    #[test]
    fn test_duplicate_keys_do_not_panic() {
        let hx = Harness::new();
        let old = list(&["a", "a", "b"]);
        let ul = hx.mount(&old);

        hx.update(&list(&["b", "a", "a"]), &old);
        assert_eq!(hx.doc.borrow().text_content(ul), "BAA");
        assert_eq!(hx.doc.borrow().child_count(ul), 3);
    }

    #[test]
    fn test_unkeyed_tail_is_trimmed() {
        let hx = Harness::new();
        let old = plain(&["a", "b", "c"]);
        let ul = hx.mount(&old);
        let before = hx.doc.borrow().children(ul);

        hx.update(&plain(&["x"]), &old);

        let after = hx.doc.borrow().children(ul);
        assert_eq!(after, vec![before[0]]);
        assert_eq!(hx.doc.borrow().text_content(ul), "x");
    }

    #[test]
    fn test_tag_change_replaces_and_releases_handlers() {
        let hx = Harness::new();
        let old: Node = Element::new("div")
            .child(Element::new("button").on(EventKind::Click, |_| {}))
            .into();
        let new: Node = Element::new("div").child(Element::new("a")).into();
        let div = hx.mount(&old);
        let button = hx.doc.borrow().children(div)[0];
        assert_eq!(hx.registry.handler_count(), 1);

        hx.update(&new, &old);

        let link = hx.doc.borrow().children(div)[0];
        assert_ne!(link, button);
        assert_eq!(hx.doc.borrow().tag(link).as_deref(), Some("a"));
        assert_eq!(hx.registry.handler_count(), 0);
    }

    #[test]
    fn test_text_patched_in_place() {
        let hx = Harness::new();
        let old: Node = Element::new("p").child("one").into();
        let new: Node = Element::new("p").child("two").into();
        let p = hx.mount(&old);
        let t = hx.doc.borrow().children(p)[0];
        hx.reset();

        hx.update(&new, &old);

        assert_eq!(hx.doc.borrow().children(p), vec![t]);
        assert_eq!(hx.doc.borrow().stats().text_writes, 1);
        assert_eq!(hx.doc.borrow().stats().total(), 1);
    }

    #[test]
    fn test_reconcile_absent_positions() {
        let hx = Harness::new();
        let node: Node = Element::new("p").into();
        let mut doc = hx.doc.borrow_mut();
        let root = doc.root();
        let mut reconciler = Reconciler::new(&mut *doc, &hx.registry);

        reconciler.reconcile(root, None, None, 0).unwrap();
        reconciler.reconcile(root, Some(&node), None, 0).unwrap();
        reconciler.reconcile(root, None, Some(&node), 0).unwrap();
        drop(reconciler);
        assert_eq!(doc.child_count(root), 0);
    }

    #[test]
    fn test_unkeyed_siblings_of_keyed_children_are_kept() {
        let hx = Harness::new();
        let tree: Node = Element::new("ul")
            .child(Element::new("li").key(1u64).child("A"))
            .child(Element::new("li").child("plain"))
            .child("tail")
            .into();
        let ul = hx.mount(&tree);
        let before = hx.doc.borrow().children(ul);
        hx.reset();

        hx.update(&tree.clone(), &tree);

        assert!(hx.doc.borrow().stats().is_empty());
        assert_eq!(hx.doc.borrow().children(ul), before);
    }

    #[test]
    fn test_unkeyed_input_beside_keyed_items_keeps_typed_value() {
        let hx = Harness::new();
        let render = |keys: &[&str]| -> Node {
            Element::new("div")
                .child(Element::new("input").class("draft"))
                .children(keys.iter().map(|k| Element::new("p").key(*k).child(*k)))
                .into()
        };
        let old = render(&["a", "b"]);
        let div = hx.mount(&old);
        let input = hx.doc.borrow().children(div)[0];
        hx.doc.borrow_mut().user_set_value(input, "typing").unwrap();

        hx.update(&render(&["b", "a", "c"]), &old);

        let children = hx.doc.borrow().children(div);
        assert_eq!(children[0], input);
        assert_eq!(hx.doc.borrow().value(input).as_deref(), Some("typing"));
        assert_eq!(hx.doc.borrow().text_content(div), "bac");
    }
}
