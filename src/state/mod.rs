//! State Module - Runtime systems behind interactivity
//!
//! - **Timer** - Clock and one-shot timers behind a [`Scheduler`] capability
//! - **Events** - Delegated handler registry and click/double-click detection

mod events;
mod timer;

pub use events::*;
pub use timer::*;
