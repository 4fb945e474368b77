//! TodoMVC - The example application.
//!
//! - [`TodoState`] / [`TodoPatch`] - State and shallow-merge patches
//! - [`view::render`] - TodoMVC markup
//! - [`TodoApp`] - Render manager plus routes `/`, `/active`, `/completed`
//!   and `/404`
//!
//! ```ignore
//! use spark_dom::todo::TodoApp;
//!
//! let app = TodoApp::new(registry, container);
//! app.mount()?;
//! app.navigate("#/active");
//! ```

mod app;
mod model;
pub mod view;

pub use app::TodoApp;
#[cfg(feature = "web")]
pub use app::WebTodoApp;
pub use model::{pluralize, Filter, Todo, TodoPatch, TodoState};
