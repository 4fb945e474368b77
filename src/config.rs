//! Framework configuration.

use crate::types::EventKinds;

/// Options for an [`EventRegistry`](crate::state::EventRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Kinds that get one native listener on the document root.
    ///
    /// `DOUBLE_CLICK` is ignored here: double clicks are derived from clicks.
    pub delegated_kinds: EventKinds,
    /// Run native clicks through the click/double-click state machine.
    ///
    /// When disabled, clicks dispatch immediately and no double click is ever
    /// produced.
    pub disambiguate_clicks: bool,
}

impl Config {
    /// Replace the delegated kinds.
    pub fn with_kinds(mut self, kinds: EventKinds) -> Self {
        self.delegated_kinds = kinds;
        self
    }

    /// Dispatch clicks immediately instead of waiting for a possible second click.
    pub fn without_click_disambiguation(mut self) -> Self {
        self.disambiguate_clicks = false;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delegated_kinds: EventKinds::CLICK
                | EventKinds::KEY_DOWN
                | EventKinds::KEY_UP
                | EventKinds::INPUT
                | EventKinds::CHANGE
                | EventKinds::SCROLL
                | EventKinds::SUBMIT,
            disambiguate_clicks: true,
        }
    }
}
