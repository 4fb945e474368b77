//! Mount API - Render manager lifecycle.
//!
//! A [`RenderManager`] owns the application state, the render function and
//! the tree from the last pass. Every state change renders a fresh tree and
//! reconciles it against that baseline.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::pipeline::{Merge, RenderManager};
//! use spark_dom::primitives::Element;
//! use spark_dom::EventKind;
//!
//! #[derive(Clone, PartialEq)]
//! struct Counter { count: u32 }
//!
//! let manager = RenderManager::new(registry, container, Counter { count: 0 }, |state, handle| {
//!     let handle = handle.clone();
//!     Element::new("button")
//!         .on(EventKind::Click, move |_| handle.update(|s| s.count += 1))
//!         .child(state.count.to_string())
//!         .into()
//! });
//!
//! manager.mount()?;
//! manager.update(|s| s.count = 10)?;
//! manager.unmount()?;
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};
use tracing::{debug, error};

use crate::engine::Reconciler;
use crate::error::{DomError, Result};
use crate::primitives::Node;
use crate::renderer::Document;
use crate::state::EventRegistry;
use crate::types::{Callback, EventKind, NodeId};

// =============================================================================
// Shallow merge
// =============================================================================

/// State that accepts partial updates.
///
/// Fields present in the patch overwrite, all others are retained.
pub trait Merge {
    type Patch;

    fn merge(&mut self, patch: Self::Patch);
}

/// Render function: current state and a handle for wiring callbacks.
pub type RenderFn<S, D> = dyn Fn(&S, &Handle<S, D>) -> Node;

// =============================================================================
// Render Manager
// =============================================================================

struct ManagerInner<S: Clone + PartialEq + 'static, D: Document + 'static> {
    registry: EventRegistry<D>,
    container: NodeId,
    state: Signal<S>,
    render: Box<RenderFn<S, D>>,
    previous: RefCell<Option<Node>>,
    root: Cell<Option<NodeId>>,
    mounted: Cell<bool>,
    rendering: Cell<bool>,
    dirty: Cell<bool>,
    passes: Cell<u64>,
}

/// Owns state, render function and the previous tree.
///
/// Cheap to clone; clones drive the same mounted tree.
pub struct RenderManager<S: Clone + PartialEq + 'static, D: Document + 'static> {
    inner: Rc<ManagerInner<S, D>>,
}

impl<S: Clone + PartialEq + 'static, D: Document + 'static> Clone for RenderManager<S, D> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<S: Clone + PartialEq + 'static, D: Document + 'static> RenderManager<S, D> {
    /// Create a manager that will render under `container`.
    ///
    /// Nothing is rendered until [`mount`](Self::mount).
    pub fn new(
        registry: EventRegistry<D>,
        container: NodeId,
        initial: S,
        render: impl Fn(&S, &Handle<S, D>) -> Node + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ManagerInner {
                registry,
                container,
                state: signal(initial),
                render: Box::new(render),
                previous: RefCell::new(None),
                root: Cell::new(None),
                mounted: Cell::new(false),
                rendering: Cell::new(false),
                dirty: Cell::new(false),
                passes: Cell::new(0),
            }),
        }
    }

    /// Install the root listeners, render, and append the result under the
    /// container. Mounting twice returns the existing root.
    pub fn mount(&self) -> Result<NodeId> {
        if let Some(root) = self.inner.root.get() {
            return Ok(root);
        }
        self.inner.registry.install()?;
        self.inner.mounted.set(true);
        if let Err(err) = self.inner.rerender() {
            self.inner.mounted.set(false);
            if let Err(cleanup) = self.inner.registry.uninstall() {
                error!(error = %cleanup, "failed to detach root listeners");
            }
            return Err(err);
        }
        self.inner
            .root
            .get()
            .ok_or(DomError::UnknownNode(self.inner.container))
    }

    /// Shallow-merge `patch` into the state and re-render.
    pub fn set_state(&self, patch: S::Patch) -> Result<()>
    where
        S: Merge,
    {
        self.inner.apply(|state| state.merge(patch))
    }

    /// Mutate the state in place and re-render.
    pub fn update(&self, f: impl FnOnce(&mut S)) -> Result<()> {
        self.inner.apply(f)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S {
        self.inner.state.get()
    }

    /// The signal holding the state. Effects reading it re-run after every
    /// state change.
    pub fn state_signal(&self) -> Signal<S> {
        self.inner.state.clone()
    }

    /// Live root of the rendered tree, while mounted.
    pub fn root(&self) -> Option<NodeId> {
        self.inner.root.get()
    }

    pub fn container(&self) -> NodeId {
        self.inner.container
    }

    pub fn registry(&self) -> &EventRegistry<D> {
        &self.inner.registry
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    /// Number of completed render passes.
    pub fn render_count(&self) -> u64 {
        self.inner.passes.get()
    }

    /// Handle for wiring callbacks outside the render function.
    pub fn handle(&self) -> Handle<S, D> {
        self.inner.handle()
    }

    /// Remove the rendered tree, release its handlers and detach the root
    /// listeners. State is kept; mounting again renders it fresh.
    pub fn unmount(&self) -> Result<()> {
        let inner = &self.inner;
        inner.mounted.set(false);
        if let Some(root) = inner.root.take() {
            let mut doc = inner
                .registry
                .document()
                .try_borrow_mut()
                .map_err(|_| DomError::Busy)?;
            Reconciler::new(&mut *doc, &inner.registry).remove(inner.container, root)?;
        }
        inner.previous.borrow_mut().take();
        inner.registry.uninstall()?;
        debug!(container = %inner.container, "unmounted");
        Ok(())
    }
}

impl<S: Clone + PartialEq + 'static, D: Document + 'static> ManagerInner<S, D> {
    fn handle(self: &Rc<Self>) -> Handle<S, D> {
        Handle { inner: Rc::downgrade(self) }
    }

    fn apply(self: &Rc<Self>, f: impl FnOnce(&mut S)) -> Result<()> {
        let mut next = self.state.get();
        f(&mut next);
        self.state.set(next);
        debug!(pass = self.passes.get(), "state updated");
        self.rerender()
    }

    /// Run passes until no update arrived during the last one. An update made
    /// while a pass is running only marks the manager dirty.
    fn rerender(self: &Rc<Self>) -> Result<()> {
        if !self.mounted.get() {
            return Ok(());
        }
        if self.rendering.get() {
            self.dirty.set(true);
            return Ok(());
        }

        self.rendering.set(true);
        let result = loop {
            self.dirty.set(false);
            if let Err(err) = self.pass() {
                break Err(err);
            }
            if !self.dirty.get() {
                break Ok(());
            }
        };
        self.rendering.set(false);
        result
    }

    fn pass(self: &Rc<Self>) -> Result<()> {
        let state = self.state.get();
        let next = (self.render)(&state, &self.handle());

        let mut doc = self
            .registry
            .document()
            .try_borrow_mut()
            .map_err(|_| DomError::Busy)?;
        let mut reconciler = Reconciler::new(&mut *doc, &self.registry);

        let previous = self.previous.borrow();
        let live = match (previous.as_ref(), self.root.get()) {
            (Some(old), Some(live)) => reconciler.patch(self.container, live, &next, old)?,
            _ => reconciler.mount(self.container, &next)?,
        };
        drop(previous);

        self.root.set(Some(live));
        *self.previous.borrow_mut() = Some(next);
        self.passes.set(self.passes.get() + 1);
        Ok(())
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Weak handle given to the render function.
///
/// Callbacks capture clones of it to update state. Once the manager is
/// dropped every operation becomes a no-op.
pub struct Handle<S: Clone + PartialEq + 'static, D: Document + 'static> {
    inner: Weak<ManagerInner<S, D>>,
}

impl<S: Clone + PartialEq + 'static, D: Document + 'static> Clone for Handle<S, D> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<S: Clone + PartialEq + 'static, D: Document + 'static> Handle<S, D> {
    /// Shallow-merge `patch` and re-render. Errors are logged.
    pub fn set_state(&self, patch: S::Patch)
    where
        S: Merge,
    {
        self.update(|state| state.merge(patch));
    }

    /// Mutate state and re-render. Errors are logged.
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if let Err(err) = inner.apply(f) {
            error!(error = %err, "render pass failed");
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Option<S> {
        self.inner.upgrade().map(|inner| inner.state.get())
    }

    /// Register a delegated handler for elements marked with
    /// [`Element::delegate`](crate::primitives::Element::delegate).
    pub fn register(&self, kind: EventKind, id: impl Into<String>, callback: impl Into<Callback>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.registry.register(kind, id, callback);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use spark_signals::effect;

    use super::*;
    use crate::primitives::Element;
    use crate::renderer::{click, MemoryDocument};
    use crate::state::ManualScheduler;
    use crate::types::DomEvent;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        count: u32,
        label: String,
    }

    #[derive(Default)]
    struct CounterPatch {
        count: Option<u32>,
        label: Option<String>,
    }

    impl Merge for Counter {
        type Patch = CounterPatch;

        fn merge(&mut self, patch: CounterPatch) {
            if let Some(count) = patch.count {
                self.count = count;
            }
            if let Some(label) = patch.label {
                self.label = label;
            }
        }
    }

    struct Fixture {
        doc: Rc<RefCell<MemoryDocument>>,
        clock: ManualScheduler,
        manager: RenderManager<Counter, MemoryDocument>,
    }

    fn setup() -> Fixture {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let clock = ManualScheduler::new();
        let registry = EventRegistry::new(doc.clone(), Rc::new(clock.clone()));
        let container = doc.borrow().root();
        let initial = Counter { count: 0, label: "clicks".into() };
        let manager = RenderManager::new(registry, container, initial, |state, handle| {
            let handle = handle.clone();
            Element::new("button")
                .on(EventKind::Click, move |_| handle.update(|s| s.count += 1))
                .child(format!("{} {}", state.count, state.label))
                .into()
        });
        Fixture { doc, clock, manager }
    }

    fn html(fx: &Fixture) -> String {
        let doc = fx.doc.borrow();
        doc.to_html(doc.root())
    }

    #[test]
    fn test_mount_renders_once() {
        let fx = setup();
        let root = fx.manager.mount().unwrap();
        assert_eq!(fx.manager.mount().unwrap(), root);
        assert_eq!(fx.manager.render_count(), 1);
        assert!(html(&fx).contains("0 clicks"));
    }

    #[test]
    fn test_set_state_merges_shallowly() {
        let fx = setup();
        fx.manager.mount().unwrap();
        fx.manager
            .set_state(CounterPatch { count: Some(5), ..Default::default() })
            .unwrap();

        assert_eq!(fx.manager.state(), Counter { count: 5, label: "clicks".into() });
        assert!(html(&fx).contains("5 clicks"));
    }

    #[test]
    fn test_set_state_before_mount_only_stores() {
        let fx = setup();
        fx.manager
            .set_state(CounterPatch { label: Some("taps".into()), ..Default::default() })
            .unwrap();
        assert_eq!(fx.manager.render_count(), 0);

        fx.manager.mount().unwrap();
        assert!(html(&fx).contains("0 taps"));
    }

    #[test]
    fn test_click_updates_through_handle() {
        let fx = setup();
        let root = fx.manager.mount().unwrap();
        let before = fx.manager.root();

        click(&fx.doc, root);
        fx.clock.advance(std::time::Duration::from_millis(300));

        assert_eq!(fx.manager.state().count, 1);
        assert!(html(&fx).contains("1 clicks"));
        assert_eq!(fx.manager.root(), before);
    }

    #[test]
    fn test_state_signal_notifies_effects() {
        let fx = setup();
        fx.manager.mount().unwrap();
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let sig = fx.manager.state_signal();
        let _stop = effect(move || {
            let _ = sig.get();
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        fx.manager.update(|s| s.count = 3).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_update_during_render_is_deferred() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let registry = EventRegistry::new(doc.clone(), Rc::new(ManualScheduler::new()));
        let container = doc.borrow().root();
        let manager = RenderManager::new(registry, container, 0u32, |state, handle| {
            // Count up to 3 from inside the render function.
            if *state < 3 {
                handle.update(|s| *s += 1);
            }
            Element::new("p").child(state.to_string()).into()
        });

        manager.mount().unwrap();
        assert_eq!(manager.state(), 3);
        assert_eq!(manager.render_count(), 4);
        assert_eq!(doc.borrow().text_content(container), "3");
    }

    #[test]
    fn test_unmount_releases_everything() {
        let fx = setup();
        fx.manager.mount().unwrap();
        assert_eq!(fx.manager.registry().handler_count(), 1);

        fx.manager.unmount().unwrap();
        assert_eq!(fx.manager.registry().handler_count(), 0);
        assert!(!fx.manager.registry().is_installed());
        assert_eq!(html(&fx), "<body></body>");
        assert!(!fx.manager.is_mounted());
    }

    #[test]
    fn test_handle_register_delegates() {
        let fx = setup();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        fx.manager.handle().register(EventKind::KeyDown, "k", move |_: &DomEvent| {
            hits_clone.set(hits_clone.get() + 1)
        });
        assert!(fx.manager.registry().is_registered(EventKind::KeyDown, "k"));
    }

    #[test]
    fn test_failed_mount_detaches_root_listeners() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let registry = EventRegistry::new(doc.clone(), Rc::new(ManualScheduler::new()));
        let missing = NodeId::new(999);
        let manager = RenderManager::new(registry, missing, 0u32, |count, _| {
            Element::new("p").child(count.to_string()).into()
        });

        assert_eq!(manager.mount(), Err(DomError::UnknownNode(missing)));
        assert!(!manager.is_mounted());
        assert!(!manager.registry().is_installed());
        let root = doc.borrow().root();
        assert_eq!(doc.borrow().listener_count(root, EventKind::Click), 0);
    }
}
