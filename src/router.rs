//! Hash Router - Maps `location.hash` to actions.
//!
//! # API
//!
//! - `Router::new()` then `.route(path, action)` - Build the table
//! - `resolve(hash)` - Path that would run for `hash`
//! - `navigate(hash)` - Run it
//! - `current()` - Last path navigated to
//! - `install()` - Follow `hashchange` in the browser (feature `web`)
//!
//! Hashes are normalized before lookup: the leading `#` is dropped and an
//! empty hash means `/`. Unknown paths fall back to the [`NOT_FOUND`] route
//! when one is registered.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::router::Router;
//!
//! let router = Router::new()
//!     .route("/", || show_all())
//!     .route("/active", || show_active())
//!     .route("/404", || show_missing());
//!
//! router.navigate("#/active");
//! router.navigate("#/nope"); // runs the /404 action
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

/// Path of the fallback route.
pub const NOT_FOUND: &str = "/404";

/// Action run when a route is entered.
pub type RouteAction = Rc<dyn Fn()>;

/// Table of path → action.
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, RouteAction>,
    current: RefCell<Option<String>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the action for `path`.
    pub fn route(mut self, path: impl Into<String>, action: impl Fn() + 'static) -> Self {
        self.routes.insert(path.into(), Rc::new(action));
        self
    }

    /// Strip the leading `#`; an empty hash is `/`.
    pub fn normalize(hash: &str) -> &str {
        let path = hash.strip_prefix('#').unwrap_or(hash);
        if path.is_empty() { "/" } else { path }
    }

    /// The registered path `hash` leads to, after the 404 fallback.
    pub fn resolve(&self, hash: &str) -> Option<&str> {
        let path = Self::normalize(hash);
        if let Some((known, _)) = self.routes.get_key_value(path) {
            return Some(known.as_str());
        }
        self.routes
            .get_key_value(NOT_FOUND)
            .map(|(known, _)| known.as_str())
    }

    /// Run the action for `hash`. Returns whether any action ran.
    pub fn navigate(&self, hash: &str) -> bool {
        let Some(path) = self.resolve(hash) else {
            debug!(hash, "no route and no fallback");
            return false;
        };
        let Some(action) = self.routes.get(path).cloned() else {
            return false;
        };
        debug!(hash, path, "navigate");
        *self.current.borrow_mut() = Some(path.to_string());
        action();
        true
    }

    /// Path of the last successful navigation.
    pub fn current(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

// =============================================================================
// Browser integration
// =============================================================================

#[cfg(feature = "web")]
pub use web::HashListener;

#[cfg(feature = "web")]
mod web {
    use std::rc::Rc;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;

    use super::Router;
    use crate::error::{DomError, Result};

    /// Keeps the `hashchange` listener attached; dropping it detaches.
    pub struct HashListener {
        window: web_sys::Window,
        closure: Closure<dyn FnMut(web_sys::Event)>,
    }

    impl Drop for HashListener {
        fn drop(&mut self) {
            let _ = self.window.remove_event_listener_with_callback(
                "hashchange",
                self.closure.as_ref().unchecked_ref(),
            );
        }
    }

    impl Router {
        /// Navigate to the current hash, then follow every `hashchange`.
        pub fn install(self: &Rc<Self>) -> Result<HashListener> {
            let window = web_sys::window().ok_or(DomError::DomUnavailable)?;
            let weak = Rc::downgrade(self);
            let location = window.location();
            let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
                if let Some(router) = weak.upgrade() {
                    let hash = location.hash().unwrap_or_default();
                    router.navigate(&hash);
                }
            });
            window.add_event_listener_with_callback(
                "hashchange",
                closure.as_ref().unchecked_ref(),
            )?;
            self.navigate(&window.location().hash().unwrap_or_default());
            Ok(HashListener { window, closure })
        }
    }
}
