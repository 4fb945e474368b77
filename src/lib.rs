//! # spark-dom
//!
//! Virtual DOM renderer with keyed reconciliation and delegated events.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals): the
//! render manager keeps application state in a signal, so outside code can
//! follow it with effects.
//!
//! ## Architecture
//!
//! Every state change renders a fresh node tree, which the reconciler
//! compares against the previous one to mutate a live document:
//! ```text
//! state → render fn → Node tree → Reconciler(new, old, live) → live document
//! native event → root listener → EventRegistry → callback → set_state
//! ```
//!
//! The live document and the clock are capabilities ([`renderer::Document`],
//! [`state::Scheduler`]), so everything runs headless against
//! [`renderer::MemoryDocument`] and [`state::ManualScheduler`], or in the
//! browser with the `web` feature.
//!
//! ## Modules
//!
//! - [`types`] - Node handles, event kinds, synthetic events, callbacks
//! - [`primitives`] - Node tree builders (`Element`, `h`, `text`)
//! - [`renderer`] - Live document capability and backends
//! - [`state`] - Event registry, click/double-click detection, timers
//! - [`engine`] - Materialization and reconciliation
//! - [`pipeline`] - Render manager
//! - [`router`] - Hash router
//! - [`todo`] - TodoMVC application

pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod renderer;
pub mod router;
pub mod state;
pub mod todo;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::Config;
pub use error::{DomError, Result};

pub use engine::{handler_id, Reconciler};

pub use primitives::{h, text, Attr, Element, Key, Node};

pub use renderer::{Document, MemoryDocument, MutationStats};
#[cfg(feature = "web")]
pub use renderer::{WebDocument, WebScheduler};

pub use state::{EventRegistry, ManualScheduler, Scheduler, TimerId, DOUBLE_CLICK_WINDOW};

pub use pipeline::{Handle, Merge, RenderManager};

pub use router::Router;
