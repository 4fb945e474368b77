//! Attribute patching.
//!
//! `value` and `checked` are live properties: they are compared against the
//! live node, not against the previous tree, so a value the user typed is
//! never rewritten with the same string.
//!
//! Handlers always go through the registry behind a `data-on<kind>` marker.
//! Kinds no root listener covers also get one direct listener on the node,
//! which forwards to whatever handler is registered at the time.

use tracing::trace;

use super::reconciler::{handler_id, Reconciler};
use crate::error::Result;
use crate::primitives::{Attr, Element};
use crate::renderer::Document;
use crate::types::NodeId;

impl<D: Document + 'static> Reconciler<'_, D> {
    /// Remove what `old` had and `new` lacks, then apply what changed.
    pub(super) fn patch_attributes(&mut self, live: NodeId, new: &Element, old: &Element) -> Result<()> {
        for (name, previous) in old.attrs() {
            if new.get_attr(name).is_none() {
                self.remove_attribute(live, name, previous)?;
            }
        }
        for (name, value) in new.attrs() {
            let previous = old.get_attr(name);
            if previous != Some(value) {
                self.apply_attribute(live, name, value, previous)?;
            }
        }
        Ok(())
    }

    /// Write one attribute. `previous` is the value the live node currently
    /// reflects, if any.
    pub(super) fn apply_attribute(
        &mut self,
        live: NodeId,
        name: &str,
        value: &Attr,
        previous: Option<&Attr>,
    ) -> Result<()> {
        if let Some(previous @ Attr::Handler(previous_kind, _)) = previous {
            let same_kind = matches!(value, Attr::Handler(kind, _) if kind == previous_kind);
            if !same_kind {
                self.remove_attribute(live, name, previous)?;
            }
        }

        match (name, value) {
            (_, Attr::Handler(kind, callback)) => {
                let id = handler_id(live);
                self.registry.register(*kind, id.as_str(), callback.clone());
                let marker = kind.marker();
                if self.doc.attribute(live, &marker).as_deref() != Some(id.as_str()) {
                    self.doc.set_attribute(live, &marker, &id)?;
                }
                if !self.registry.is_delegated(*kind) {
                    if let Some(listener) = self.registry.direct_listener(*kind, &id) {
                        trace!(%live, %kind, "direct listener");
                        self.doc.add_listener(live, *kind, listener)?;
                    }
                }
            }
            ("value", value) => {
                let text = value.as_text();
                if self.doc.value(live).as_deref() != Some(text.as_str()) {
                    trace!(%live, "value");
                    self.doc.set_value(live, &text)?;
                }
            }
            ("checked", value) => {
                let checked = value.truthy();
                if self.doc.checked(live) != Some(checked) {
                    self.doc.set_checked(live, checked)?;
                }
            }
            (_, Attr::Boolean(true)) => self.doc.set_attribute(live, name, "")?,
            (_, Attr::Boolean(false)) => {
                if self.doc.attribute(live, name).is_some() {
                    self.doc.remove_attribute(live, name)?;
                }
            }
            (_, Attr::Static(text)) => self.doc.set_attribute(live, name, text)?,
        }
        Ok(())
    }

    fn remove_attribute(&mut self, live: NodeId, name: &str, previous: &Attr) -> Result<()> {
        match (name, previous) {
            (_, Attr::Handler(kind, _)) => {
                let id = handler_id(live);
                if let Some(listener) = self.registry.take_direct_listener(*kind, &id) {
                    self.doc.remove_listener(live, *kind, &listener)?;
                }
                self.registry.unregister(*kind, &id);
                self.doc.remove_attribute(live, &kind.marker())?;
            }
            ("value", _) => {
                if self.doc.value(live).is_some_and(|value| !value.is_empty()) {
                    self.doc.set_value(live, "")?;
                }
            }
            ("checked", _) => {
                if self.doc.checked(live) == Some(true) {
                    self.doc.set_checked(live, false)?;
                }
            }
            (_, Attr::Boolean(false)) => {}
            _ => self.doc.remove_attribute(live, name)?,
        }
        Ok(())
    }
}
