//! Browser backend (feature `web`).
//!
//! [`WebDocument`] drives a real DOM through `web-sys`. Live nodes are kept in
//! a handle map, and each created node carries its handle in a hidden JS
//! property so native event targets can be mapped back to a [`NodeId`].
//!
//! [`WebScheduler`] implements the timer capability with `setTimeout` and
//! `performance.now()`.

use std::collections::HashMap;
use std::time::Duration;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Element, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, KeyboardEvent, Window,
};

use super::Document;
use crate::error::{DomError, Result};
use crate::state::{Scheduler, TimerId};
use crate::types::{Callback, DomEvent, EventKind, NodeId};

const ID_PROPERTY: &str = "__sparkDomId";

impl From<JsValue> for DomError {
    fn from(value: JsValue) -> Self {
        value
            .as_string()
            .map_or_else(|| Self::Js(format!("{value:?}")), Self::Js)
    }
}

fn read_id(value: &JsValue) -> Option<NodeId> {
    js_sys::Reflect::get(value, &JsValue::from_str(ID_PROPERTY))
        .ok()?
        .as_f64()
        .map(|raw| NodeId::new(raw as u64))
}

/// Nearest node at or above the event target that has a handle.
fn target_id(event: &web_sys::Event) -> Option<NodeId> {
    let mut node = event.target()?.dyn_into::<web_sys::Node>().ok()?;
    loop {
        if let Some(id) = read_id(&node) {
            return Some(id);
        }
        node = node.parent_node()?;
    }
}

fn synthesize(kind: EventKind, native: &web_sys::Event) -> Option<DomEvent> {
    let mut event = DomEvent::new(kind, target_id(native)?);
    if let Some(keyboard) = native.dyn_ref::<KeyboardEvent>() {
        event.key = Some(keyboard.key());
    }
    if let Some(element) = native
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
    {
        event.value = control_value(&element);
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            event.checked = Some(input.checked());
        }
    }
    Some(event)
}

/// Live `value` property of a form control.
fn control_value(element: &Element) -> Option<String> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        return Some(area.value());
    }
    element.dyn_ref::<HtmlSelectElement>().map(HtmlSelectElement::value)
}

// =============================================================================
// WebDocument
// =============================================================================

struct Listener {
    node: NodeId,
    kind: EventKind,
    callback: Callback,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

/// [`Document`] backed by the browser DOM.
pub struct WebDocument {
    document: web_sys::Document,
    root: NodeId,
    nodes: HashMap<NodeId, web_sys::Node>,
    next_id: u64,
    listeners: Vec<Listener>,
}

impl WebDocument {
    /// Attach to `window.document`. The document node itself is the root.
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or(DomError::DomUnavailable)?;
        let document = window.document().ok_or(DomError::DomUnavailable)?;
        let mut this = Self {
            document: document.clone(),
            root: NodeId::new(0),
            nodes: HashMap::new(),
            next_id: 1,
            listeners: Vec::new(),
        };
        this.root = this.adopt(document.into())?;
        Ok(this)
    }

    /// Give an existing DOM node a handle, reusing the one it already has.
    pub fn adopt(&mut self, node: web_sys::Node) -> Result<NodeId> {
        if let Some(id) = read_id(&node) {
            if self.nodes.contains_key(&id) {
                return Ok(id);
            }
        }
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        js_sys::Reflect::set(
            &node,
            &JsValue::from_str(ID_PROPERTY),
            &JsValue::from_f64(id.raw() as f64),
        )?;
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Handle of the element with DOM id `id`, typically the mount container.
    pub fn element_by_id(&mut self, id: &str) -> Result<NodeId> {
        let element = self
            .document
            .get_element_by_id(id)
            .ok_or_else(|| DomError::RootNotFound(id.to_string()))?;
        self.adopt(element.into())
    }

    /// The DOM node behind a handle.
    pub fn node(&self, id: NodeId) -> Option<&web_sys::Node> {
        self.nodes.get(&id)
    }

    fn get(&self, id: NodeId) -> Result<&web_sys::Node> {
        self.nodes.get(&id).ok_or(DomError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&Element> {
        self.get(id)?
            .dyn_ref::<Element>()
            .ok_or(DomError::NotAnElement(id))
    }

    fn handle_of(&self, node: Option<web_sys::Node>) -> Option<NodeId> {
        node.and_then(|node| read_id(&node))
            .filter(|id| self.nodes.contains_key(id))
    }
}

impl Document for WebDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        let element = self.document.create_element(tag)?;
        self.adopt(element.into())
    }

    fn create_text(&mut self, text: &str) -> Result<NodeId> {
        let node = self.document.create_text_node(text);
        self.adopt(node.into())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?.append_child(self.get(child)?)?;
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let reference = reference.map(|id| self.get(id)).transpose()?;
        self.get(parent)?.insert_before(self.get(child)?, reference)?;
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?.remove_child(self.get(child)?)?;
        Ok(())
    }

    fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<()> {
        self.get(parent)?.replace_child(self.get(new)?, self.get(old)?)?;
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.handle_of(self.nodes.get(&node)?.parent_node())
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        let children = self.nodes.get(&parent)?.child_nodes();
        self.handle_of(children.item(u32::try_from(index).ok()?))
    }

    fn child_count(&self, parent: NodeId) -> usize {
        self.nodes
            .get(&parent)
            .map_or(0, |node| node.child_nodes().length() as usize)
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        self.element(node).ok().map(|el| el.tag_name().to_ascii_lowercase())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node).ok()?.get_attribute(name)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.element(node)?.set_attribute(name, value)?;
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.element(node)?.remove_attribute(name)?;
        Ok(())
    }

    fn text(&self, node: NodeId) -> Option<String> {
        let node = self.nodes.get(&node)?;
        if node.node_type() == web_sys::Node::TEXT_NODE {
            node.text_content()
        } else {
            None
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        let live = self.get(node)?;
        if live.node_type() != web_sys::Node::TEXT_NODE {
            return Err(DomError::NotText(node));
        }
        live.set_text_content(Some(text));
        Ok(())
    }

    fn value(&self, node: NodeId) -> Option<String> {
        let element = self.element(node).ok()?;
        control_value(&element).or_else(|| Some(element.get_attribute("value").unwrap_or_default()))
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        let element = self.element(node)?;
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else {
            element.set_attribute("value", value)?;
        }
        Ok(())
    }

    fn checked(&self, node: NodeId) -> Option<bool> {
        let element = self.element(node).ok()?;
        Some(
            element
                .dyn_ref::<HtmlInputElement>()
                .is_some_and(HtmlInputElement::checked),
        )
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<()> {
        if let Some(input) = self.element(node)?.dyn_ref::<HtmlInputElement>() {
            input.set_checked(checked);
        }
        Ok(())
    }

    fn add_listener(&mut self, node: NodeId, kind: EventKind, callback: Callback) -> Result<()> {
        let target = self.get(node)?.clone();
        let cb = callback.clone();
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |native: web_sys::Event| {
            let Some(event) = synthesize(kind, &native) else {
                return;
            };
            cb.call(&event);
            if event.default_prevented() {
                native.prevent_default();
            }
        });
        // Non-bubbling kinds are caught in the capture phase so a root
        // listener still sees them.
        target.add_event_listener_with_callback_and_bool(
            kind.name(),
            closure.as_ref().unchecked_ref(),
            !kind.bubbles(),
        )?;
        self.listeners.push(Listener { node, kind, callback, closure });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: NodeId,
        kind: EventKind,
        callback: &Callback,
    ) -> Result<()> {
        let Some(index) = self.listeners.iter().position(|l| {
            l.node == node && l.kind == kind && l.callback.ptr_eq(callback)
        }) else {
            return Ok(());
        };
        let listener = self.listeners.remove(index);
        self.get(node)?.remove_event_listener_with_callback_and_bool(
            kind.name(),
            listener.closure.as_ref().unchecked_ref(),
            !kind.bubbles(),
        )?;
        Ok(())
    }

    fn discard(&mut self, node: NodeId) {
        let Some(live) = self.nodes.get(&node).cloned() else {
            return;
        };
        if live.parent_node().is_some() {
            return;
        }
        let mut stack = vec![live];
        while let Some(current) = stack.pop() {
            if let Some(id) = read_id(&current) {
                self.nodes.remove(&id);
                self.listeners.retain(|l| l.node != id);
            }
            let children = current.child_nodes();
            for i in 0..children.length() {
                if let Some(child) = children.item(i) {
                    stack.push(child);
                }
            }
        }
    }
}

// =============================================================================
// WebScheduler
// =============================================================================

/// [`Scheduler`] backed by `window.setTimeout`.
pub struct WebScheduler {
    window: Window,
}

impl WebScheduler {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or(DomError::DomUnavailable)?;
        Ok(Self { window })
    }
}

impl Scheduler for WebScheduler {
    fn now(&self) -> Duration {
        let millis = self
            .window
            .performance()
            .map_or_else(js_sys::Date::now, |performance| performance.now());
        Duration::from_secs_f64(millis / 1000.0)
    }

    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Result<TimerId> {
        // A cleared timer never runs, and its closure is leaked with it.
        let callback = Closure::once_into_js(move || task());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let handle = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                millis,
            )?;
        Ok(TimerId::new(handle as u64))
    }

    fn clear_timeout(&self, id: TimerId) {
        self.window.clear_timeout_with_handle(id.raw() as i32);
    }
}
