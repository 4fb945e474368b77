//! Events Module - Delegated handler registry
//!
//! One native listener per event kind sits on the document root. When a
//! native event arrives, the registry walks from the target towards the root
//! looking for a `data-on<kind>` marker attribute whose value names a
//! registered handler, and invokes the first one it finds.
//!
//! Kinds without a root listener (focus and blur by default) are reached
//! through direct listeners instead: [`direct_listener`](EventRegistry::direct_listener)
//! hands out one forwarding callback per (kind, id) for the owner node.
//!
//! Clicks go through a small state machine first, so a quick second click on
//! the same node produces one `dblclick` dispatch instead of two clicks.
//!
//! # API
//!
//! - `register(kind, id, callback)` - Insert or overwrite a handler
//! - `unregister(kind, id)` - Remove a handler
//! - `dispatch(kind, event)` - Resolve and invoke, no click logic
//! - `handle_click(event)` - Feed the click state machine
//! - `handle_native(event)` - Entry point for root listeners
//! - `install()` / `uninstall()` - Attach or detach the root listeners
//! - `is_delegated(kind)` - Whether a root listener covers `kind`
//! - `direct_listener(kind, id)` - Forwarding callback for a node listener
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::state::EventRegistry;
//! use spark_dom::EventKind;
//!
//! let registry = EventRegistry::new(document.clone(), scheduler);
//! registry.register(EventKind::Click, "remove-3", |_event| remove(3));
//! registry.install()?;
//!
//! // <button data-onclick="remove-3"> now reacts to clicks on itself
//! // and on anything inside it.
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::timer::{Scheduler, TimerId};
use crate::config::Config;
use crate::error::Result;
use crate::renderer::{ancestors, Document};
use crate::types::{Callback, DomEvent, EventKind, NodeId};

/// Two clicks on the same node closer than this form a double click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(300);

// =============================================================================
// TYPES
// =============================================================================

enum ClickState {
    Idle,
    Pending {
        target: NodeId,
        at: Duration,
        timer: TimerId,
        event: DomEvent,
    },
}

struct RegistryInner<D: Document> {
    document: Rc<RefCell<D>>,
    scheduler: Rc<dyn Scheduler>,
    config: Config,
    handlers: RefCell<HashMap<EventKind, HashMap<String, Callback>>>,
    click: RefCell<ClickState>,
    missed: Cell<usize>,
    root_listeners: RefCell<Vec<(EventKind, Callback)>>,
    direct: RefCell<HashMap<(EventKind, String), Callback>>,
}

/// Table of (kind, handler id) → callback, plus delegated dispatch.
///
/// Cheap to clone; clones share the same table.
pub struct EventRegistry<D: Document> {
    inner: Rc<RegistryInner<D>>,
}

impl<D: Document> Clone for EventRegistry<D> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<D: Document + 'static> EventRegistry<D> {
    /// Create a registry with the default [`Config`].
    pub fn new(document: Rc<RefCell<D>>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_config(document, scheduler, Config::default())
    }

    pub fn with_config(
        document: Rc<RefCell<D>>,
        scheduler: Rc<dyn Scheduler>,
        config: Config,
    ) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                document,
                scheduler,
                config,
                handlers: RefCell::new(HashMap::new()),
                click: RefCell::new(ClickState::Idle),
                missed: Cell::new(0),
                root_listeners: RefCell::new(Vec::new()),
                direct: RefCell::new(HashMap::new()),
            }),
        }
    }

    fn from_weak(weak: &Weak<RegistryInner<D>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// The live document this registry resolves markers in.
    pub fn document(&self) -> &Rc<RefCell<D>> {
        &self.inner.document
    }

    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.inner.scheduler
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    // =========================================================================
    // Handler table
    // =========================================================================

    /// Insert or overwrite the handler for (`kind`, `id`).
    pub fn register(&self, kind: EventKind, id: impl Into<String>, callback: impl Into<Callback>) {
        let id = id.into();
        trace!(%kind, id = %id, "register handler");
        self.inner
            .handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .insert(id, callback.into());
    }

    /// Remove the handler for (`kind`, `id`). Returns whether one existed.
    ///
    /// A direct listener handed out for the pair is forgotten as well.
    pub fn unregister(&self, kind: EventKind, id: &str) -> bool {
        self.inner.direct.borrow_mut().remove(&(kind, id.to_string()));
        let mut handlers = self.inner.handlers.borrow_mut();
        let Some(by_id) = handlers.get_mut(&kind) else {
            return false;
        };
        let removed = by_id.remove(id).is_some();
        if by_id.is_empty() {
            handlers.remove(&kind);
        }
        removed
    }

    pub fn is_registered(&self, kind: EventKind, id: &str) -> bool {
        self.inner
            .handlers
            .borrow()
            .get(&kind)
            .is_some_and(|by_id| by_id.contains_key(id))
    }

    /// Total number of registered handlers across all kinds.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().values().map(HashMap::len).sum()
    }

    /// Whether a root listener covers `kind`. Double clicks ride on clicks.
    pub fn is_delegated(&self, kind: EventKind) -> bool {
        let kinds = self.inner.config.delegated_kinds;
        match kind {
            EventKind::DoubleClick => kinds.contains(EventKind::Click.flag()),
            kind => kinds.contains(kind.flag()),
        }
    }

    /// Forwarding callback to attach directly to the node that owns (`kind`,
    /// `id`), for kinds no root listener covers.
    ///
    /// Returns `None` when one was already handed out for the pair, so the
    /// node keeps a single listener across re-registrations.
    pub fn direct_listener(&self, kind: EventKind, id: &str) -> Option<Callback> {
        let key = (kind, id.to_string());
        let mut direct = self.inner.direct.borrow_mut();
        if direct.contains_key(&key) {
            return None;
        }
        let weak = Rc::downgrade(&self.inner);
        let owner = id.to_string();
        let listener = Callback::new(move |event| {
            if let Some(registry) = Self::from_weak(&weak) {
                registry.call_direct(kind, &owner, event);
            }
        });
        direct.insert(key, listener.clone());
        Some(listener)
    }

    /// Take back the direct listener of (`kind`, `id`) so it can be detached.
    pub fn take_direct_listener(&self, kind: EventKind, id: &str) -> Option<Callback> {
        self.inner.direct.borrow_mut().remove(&(kind, id.to_string()))
    }

    fn call_direct(&self, kind: EventKind, id: &str, event: &DomEvent) {
        let callback = self
            .inner
            .handlers
            .borrow()
            .get(&kind)
            .and_then(|by_id| by_id.get(id))
            .cloned();
        match callback {
            Some(callback) => {
                trace!(%kind, id, target = %event.target, "direct dispatch");
                callback.call(&event.as_kind(kind));
            }
            None => {
                self.inner.missed.set(self.inner.missed.get() + 1);
                debug!(%kind, id, "direct listener without handler");
            }
        }
    }

    /// Dispatches that reached the root without finding a handler.
    pub fn missed_dispatches(&self) -> usize {
        self.inner.missed.get()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Find the handler for `kind` nearest to `origin`.
    ///
    /// A marker naming an unregistered id does not stop the walk.
    pub fn resolve(&self, kind: EventKind, origin: NodeId) -> Option<(NodeId, Callback)> {
        let document = match self.inner.document.try_borrow() {
            Ok(document) => document,
            Err(_) => {
                warn!(%kind, %origin, "document busy, cannot resolve handler");
                return None;
            }
        };
        let handlers = self.inner.handlers.borrow();
        let by_id = handlers.get(&kind)?;
        let marker = kind.marker();
        ancestors(&*document, origin).into_iter().find_map(|node| {
            let id = document.attribute(node, &marker)?;
            by_id.get(&id).map(|callback| (node, callback.clone()))
        })
    }

    /// Invoke the handler for `kind` nearest to `event.target`.
    ///
    /// Returns whether a handler ran. No borrow of the document or the table
    /// is held while the callback runs.
    pub fn dispatch(&self, kind: EventKind, event: &DomEvent) -> bool {
        match self.resolve(kind, event.target) {
            Some((node, callback)) => {
                trace!(%kind, target = %event.target, handler_node = %node, "dispatch");
                callback.call(&event.as_kind(kind));
                true
            }
            None => {
                self.inner.missed.set(self.inner.missed.get() + 1);
                debug!(%kind, target = %event.target, "no handler for event");
                false
            }
        }
    }

    /// Feed a native click into the click/double-click state machine.
    ///
    /// - Idle: start the double-click window.
    /// - Pending on the same target within the window: cancel the timer and
    ///   dispatch a double click right away. The single click never fires.
    /// - Pending otherwise: cancel the old timer and restart the window for
    ///   this click.
    /// - Window expires: dispatch the pending click.
    pub fn handle_click(&self, event: &DomEvent) {
        if !self.inner.config.disambiguate_clicks {
            self.dispatch(EventKind::Click, event);
            return;
        }

        let scheduler = &self.inner.scheduler;
        let now = scheduler.now();
        let prior = std::mem::replace(&mut *self.inner.click.borrow_mut(), ClickState::Idle);
        if let ClickState::Pending { target, at, timer, .. } = prior {
            scheduler.clear_timeout(timer);
            if target == event.target && now.saturating_sub(at) < DOUBLE_CLICK_WINDOW {
                self.dispatch(EventKind::DoubleClick, event);
                return;
            }
        }

        let weak = Rc::downgrade(&self.inner);
        let task = Box::new(move || {
            if let Some(registry) = Self::from_weak(&weak) {
                registry.flush_pending_click();
            }
        });
        match scheduler.set_timeout(DOUBLE_CLICK_WINDOW, task) {
            Ok(timer) => {
                *self.inner.click.borrow_mut() = ClickState::Pending {
                    target: event.target,
                    at: now,
                    timer,
                    event: event.clone(),
                };
            }
            Err(err) => {
                warn!(error = %err, "click timer unavailable, dispatching immediately");
                self.dispatch(EventKind::Click, event);
            }
        }
    }

    fn flush_pending_click(&self) {
        let state = std::mem::replace(&mut *self.inner.click.borrow_mut(), ClickState::Idle);
        if let ClickState::Pending { event, .. } = state {
            self.dispatch(EventKind::Click, &event);
        }
    }

    /// Target of the click waiting for its double-click window to close.
    pub fn pending_click(&self) -> Option<NodeId> {
        match &*self.inner.click.borrow() {
            ClickState::Pending { target, .. } => Some(*target),
            ClickState::Idle => None,
        }
    }

    /// Route a native event: clicks through the state machine, everything
    /// else straight to [`dispatch`](Self::dispatch). Native double clicks
    /// are ignored.
    pub fn handle_native(&self, event: &DomEvent) {
        match event.kind {
            EventKind::Click => self.handle_click(event),
            EventKind::DoubleClick => {}
            kind => {
                self.dispatch(kind, event);
            }
        }
    }

    // =========================================================================
    // Root listeners
    // =========================================================================

    /// Attach one root listener per configured kind. Calling it again is a
    /// no-op.
    pub fn install(&self) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        let mut document = self.inner.document.borrow_mut();
        let root = document.root();
        let mut installed = self.inner.root_listeners.borrow_mut();
        for kind in self.inner.config.delegated_kinds.kinds() {
            if kind == EventKind::DoubleClick {
                continue;
            }
            let weak = Rc::downgrade(&self.inner);
            let callback = Callback::new(move |event| {
                if let Some(registry) = Self::from_weak(&weak) {
                    registry.handle_native(event);
                }
            });
            document.add_listener(root, kind, callback.clone())?;
            installed.push((kind, callback));
        }
        debug!(kinds = installed.len(), "event registry installed");
        Ok(())
    }

    /// Detach the root listeners and drop any pending click.
    pub fn uninstall(&self) -> Result<()> {
        let listeners = std::mem::take(&mut *self.inner.root_listeners.borrow_mut());
        let mut document = self.inner.document.borrow_mut();
        let root = document.root();
        for (kind, callback) in &listeners {
            document.remove_listener(root, *kind, callback)?;
        }
        let state = std::mem::replace(&mut *self.inner.click.borrow_mut(), ClickState::Idle);
        if let ClickState::Pending { timer, .. } = state {
            self.inner.scheduler.clear_timeout(timer);
        }
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        !self.inner.root_listeners.borrow().is_empty()
    }
}
