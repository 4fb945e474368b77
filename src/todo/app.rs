//! Wiring of state, view and routes.

use std::rc::Rc;

use crate::error::Result;
use crate::pipeline::RenderManager;
use crate::renderer::Document;
use crate::router::{Router, NOT_FOUND};
use crate::state::EventRegistry;
use crate::types::NodeId;

use super::model::{Filter, TodoPatch, TodoState};
use super::view;

/// The TodoMVC application: a render manager plus its hash routes.
pub struct TodoApp<D: Document + 'static> {
    manager: RenderManager<TodoState, D>,
    router: Rc<Router>,
}

impl<D: Document + 'static> TodoApp<D> {
    /// Create the app rendering under `container`. Nothing is rendered until
    /// [`mount`](Self::mount).
    pub fn new(registry: EventRegistry<D>, container: NodeId) -> Self {
        Self::with_state(registry, container, TodoState::default())
    }

    pub fn with_state(registry: EventRegistry<D>, container: NodeId, state: TodoState) -> Self {
        let manager = RenderManager::new(registry, container, state, view::render::<D>);

        let mut router = Router::new();
        for filter in Filter::ALL {
            let handle = manager.handle();
            router = router.route(filter.path(), move || handle.set_state(TodoPatch::filter(filter)));
        }
        let handle = manager.handle();
        router = router.route(NOT_FOUND, move || {
            handle.set_state(TodoPatch { not_found: Some(true), ..TodoPatch::default() })
        });

        Self { manager, router: Rc::new(router) }
    }

    /// Render for the first time.
    pub fn mount(&self) -> Result<NodeId> {
        self.manager.mount()
    }

    /// Follow a hash such as `"#/active"`.
    pub fn navigate(&self, hash: &str) -> bool {
        self.router.navigate(hash)
    }

    pub fn state(&self) -> TodoState {
        self.manager.state()
    }

    pub fn manager(&self) -> &RenderManager<TodoState, D> {
        &self.manager
    }

    pub fn router(&self) -> &Rc<Router> {
        &self.router
    }
}

// =============================================================================
// Browser entry point
// =============================================================================

#[cfg(feature = "web")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::TodoApp;
    use crate::error::Result;
    use crate::renderer::{WebDocument, WebScheduler};
    use crate::router::HashListener;
    use crate::state::EventRegistry;

    /// A mounted browser app. Dropping it detaches the hash listener.
    pub struct WebTodoApp {
        pub app: TodoApp<WebDocument>,
        _routes: HashListener,
    }

    impl TodoApp<WebDocument> {
        /// Mount into the element with DOM id `container_id` and follow the
        /// location hash.
        pub fn start(container_id: &str) -> Result<WebTodoApp> {
            let mut document = WebDocument::new()?;
            let container = document.element_by_id(container_id)?;
            let document = Rc::new(RefCell::new(document));
            let registry = EventRegistry::new(document, Rc::new(WebScheduler::new()?));

            let app = TodoApp::new(registry, container);
            app.mount()?;
            let routes = app.router().install()?;
            Ok(WebTodoApp { app, _routes: routes })
        }
    }
}

#[cfg(feature = "web")]
pub use web::WebTodoApp;
