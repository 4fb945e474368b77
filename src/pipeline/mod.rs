//! Render Pipeline
//!
//! Connects application state to the live document.
//!
//! # Pipeline Architecture
//!
//! ```text
//! state --render fn--> Node tree --Reconciler(new, old, live)--> live document
//!   ^                                                                 |
//!   +---- set_state / update <---- callback <---- EventRegistry <-----+
//! ```
//!
//! ## Key Design Principles
//!
//! - **Fresh trees**: the render function builds a new tree every pass
//! - **One baseline**: the previous tree is the only thing compared against
//! - **No nesting**: updates during a pass are queued behind it

pub mod mount;

pub use mount::{Handle, Merge, RenderFn, RenderManager};
