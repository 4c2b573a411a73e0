#![forbid(unsafe_code)]

//! Registry of modals keyed by element id.
//!
//! The registry is an ordinary value owned by whatever composes the page.
//! It creates modals from selectors, hands out handles by id and tears them
//! down again with [`ModalRegistry::remove`] or [`ModalRegistry::clear`].
//!
//! # Invariants
//!
//! - At most one modal per id.
//! - Iteration follows registration order.
//! - Elements generated by a registered modal (wrapper, inner slot) are never
//!   turned into modals themselves.
//!
//! # Failure Modes
//!
//! | Call | Condition | Result |
//! |------|-----------|--------|
//! | `init` | selector does not parse | `Err(ModalError::Selector)` |
//! | `init` | a matched element has no id | `Err(ModalError::InvalidModalTarget)`, nothing created |
//! | `init` | nothing matches | `Ok(vec![])` |
//! | `get` / `remove` | unknown id | `None` |
//!
//! # Example
//!
//! ```
//! use modality_core::Document;
//! use modality_widgets::modal::{ModalOptions, ModalRegistry};
//!
//! let doc = Document::new();
//! doc.build("div").id("m1").append_to(doc.body());
//!
//! let mut registry = ModalRegistry::new(&doc);
//! let created = registry.init("#m1", &ModalOptions::new()).unwrap();
//! assert_eq!(created.len(), 1);
//! assert!(registry.init("#m1", &ModalOptions::new()).unwrap().is_empty());
//! assert_eq!(registry.len(), 1);
//! ```

use ahash::AHashMap;
use modality_core::{CompoundSelector, Document, NodeId, SelectorList};

use super::instance::Modal;
use super::settings::ModalOptions;
use crate::error::ModalError;

/// Value of `data-modality` marking an element for [`ModalRegistry::auto_init`].
pub const AUTO_INIT_VALUE: &str = "auto";

/// Modals of one document, by id.
#[derive(Debug)]
pub struct ModalRegistry {
    doc: Document,
    instances: AHashMap<String, Modal>,
    order: Vec<String>,
}

impl ModalRegistry {
    pub fn new(doc: &Document) -> Self {
        Self {
            doc: doc.clone(),
            instances: AHashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Turn every element matching `selector` into a modal.
    ///
    /// Returns the newly created modals in document order; elements whose id
    /// is already registered are skipped.
    pub fn init(&mut self, selector: &str, options: &ModalOptions) -> Result<Vec<Modal>, ModalError> {
        self.init_with(selector, options, |_| {})
    }

    /// [`init`](Self::init), running `f` once per created modal.
    pub fn init_with(
        &mut self,
        selector: &str,
        options: &ModalOptions,
        f: impl FnMut(&Modal),
    ) -> Result<Vec<Modal>, ModalError> {
        let selector = SelectorList::parse(selector)?;
        self.init_selector(&selector, options, f)
    }

    /// [`init_with`](Self::init_with) over an already parsed selector.
    pub fn init_selector(
        &mut self,
        selector: &SelectorList,
        options: &ModalOptions,
        mut f: impl FnMut(&Modal),
    ) -> Result<Vec<Modal>, ModalError> {
        let targets: Vec<(NodeId, String)> = self
            .doc
            .select(selector)
            .into_iter()
            .filter(|node| !self.is_generated(*node))
            .map(|node| {
                self.doc
                    .id(node)
                    .filter(|id| !id.is_empty())
                    .map(|id| (node, id))
                    .ok_or(ModalError::InvalidModalTarget { node })
            })
            .collect::<Result<_, _>>()?;

        let mut created = Vec::new();
        for (node, id) in targets {
            if self.instances.contains_key(&id) {
                tracing::warn!(id = %id, "modal already registered, skipping");
                continue;
            }
            let modal = Modal::new(&self.doc, node, options)?;
            self.insert(id, modal.clone());
            f(&modal);
            created.push(modal);
        }
        tracing::debug!(%selector, created = created.len(), total = self.len(), "modal init");
        Ok(created)
    }

    /// Convert every `[data-modality="auto"]` element that has an id, with
    /// default options. Elements without an id are skipped.
    pub fn auto_init(&mut self) -> Vec<Modal> {
        let selector = SelectorList::single(
            CompoundSelector::new().attribute_equals("data-modality", AUTO_INIT_VALUE),
        );
        let options = ModalOptions::new();
        let mut created = Vec::new();
        for node in self.doc.select(&selector) {
            let Some(id) = self.doc.id(node).filter(|id| !id.is_empty()) else {
                tracing::trace!(node = node.index(), "auto modal without id, skipping");
                continue;
            };
            if self.instances.contains_key(&id) {
                continue;
            }
            match Modal::new(&self.doc, node, &options) {
                Ok(modal) => {
                    self.insert(id, modal.clone());
                    created.push(modal);
                }
                Err(err) => tracing::warn!(%err, "auto modal init failed"),
            }
        }
        created
    }

    fn insert(&mut self, id: String, modal: Modal) {
        self.order.push(id.clone());
        self.instances.insert(id, modal);
    }

    fn is_generated(&self, node: NodeId) -> bool {
        self.instances
            .values()
            .any(|m| m.wrapper() == node || m.inner() == node)
    }

    pub fn get(&self, id: &str) -> Option<&Modal> {
        self.instances.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(id, modal)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Modal)> {
        self.order
            .iter()
            .filter_map(|id| self.instances.get(id).map(|m| (id.as_str(), m)))
    }

    /// Unregister and dispose the modal `id`.
    pub fn remove(&mut self, id: &str) -> Option<Modal> {
        let modal = self.instances.remove(id)?;
        self.order.retain(|k| k != id);
        modal.dispose();
        Some(modal)
    }

    /// Dispose every modal, most recently registered first.
    pub fn clear(&mut self) {
        for id in self.order.drain(..).rev() {
            if let Some(modal) = self.instances.remove(&id) {
                modal.dispose();
            }
        }
        tracing::debug!("modal registry cleared");
    }
}
