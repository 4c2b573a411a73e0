#![forbid(unsafe_code)]

//! Ordered set of trigger elements and their click-listener bindings.
//!
//! The set only does bookkeeping; attaching and detaching listeners on the
//! document is the owning modal's job.
//!
//! # Invariants
//!
//! - No element appears twice (identity match on [`NodeId`]).
//! - Insertion order is preserved; re-adding an element keeps its slot.
//! - A binding's listener is `Some` only while it is attached.

use modality_core::{ListenerId, NodeId};

/// One tracked trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerBinding {
    pub element: NodeId,
    pub listener: Option<ListenerId>,
}

/// Trigger elements of a single modal.
#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    bindings: Vec<TriggerBinding>,
}

impl TriggerSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn position(&self, element: NodeId) -> Option<usize> {
        self.bindings.iter().position(|b| b.element == element)
    }

    pub fn contains(&self, element: NodeId) -> bool {
        self.position(element).is_some()
    }

    /// True when `element` is tracked and has a listener attached.
    pub fn is_bound(&self, element: NodeId) -> bool {
        self.bindings
            .iter()
            .any(|b| b.element == element && b.listener.is_some())
    }

    /// Tracked elements in insertion order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.bindings.iter().map(|b| b.element).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TriggerBinding> {
        self.bindings.iter()
    }

    /// Track `element` with `listener`, replacing an existing binding in
    /// place. Returns the listener the replaced binding held, which the
    /// caller must detach.
    pub fn upsert(&mut self, element: NodeId, listener: Option<ListenerId>) -> Option<ListenerId> {
        match self.bindings.iter_mut().find(|b| b.element == element) {
            Some(binding) => std::mem::replace(&mut binding.listener, listener),
            None => {
                self.bindings.push(TriggerBinding { element, listener });
                None
            }
        }
    }

    /// Stop tracking `element`. Returns the removed binding, if any.
    pub fn remove(&mut self, element: NodeId) -> Option<TriggerBinding> {
        let idx = self.position(element)?;
        Some(self.bindings.remove(idx))
    }

    /// Set the listener of a tracked element. Returns `false` if untracked.
    pub fn set_listener(&mut self, element: NodeId, listener: ListenerId) -> bool {
        match self.bindings.iter_mut().find(|b| b.element == element) {
            Some(binding) => {
                binding.listener = Some(listener);
                true
            }
            None => false,
        }
    }

    /// Clear every attached listener, keeping the elements tracked.
    pub fn take_listeners(&mut self) -> Vec<ListenerId> {
        self.bindings
            .iter_mut()
            .filter_map(|b| b.listener.take())
            .collect()
    }

    /// Remove everything, returning the listeners that were attached.
    pub fn drain(&mut self) -> Vec<ListenerId> {
        self.bindings
            .drain(..)
            .filter_map(|b| b.listener)
            .collect()
    }
}
