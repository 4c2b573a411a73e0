#![forbid(unsafe_code)]

//! Focus bookkeeping for accessible modals.
//!
//! Opening a modal schedules a deferred focus of its element; closing it
//! hands focus back to the trigger that last fired. Every transition bumps a
//! generation counter, and the deferred focus only applies if the generation
//! it was scheduled under is still current.
//!
//! # Invariants
//!
//! - `generation` never decreases.
//! - At most one deferred focus is pending per modal.

use modality_core::{Document, NodeId, TimerId};

/// Per-modal focus state.
#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    generation: u64,
    last_triggered: Option<NodeId>,
    pending: Option<TimerId>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new generation and return it.
    pub fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    #[inline]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn last_triggered(&self) -> Option<NodeId> {
        self.last_triggered
    }

    pub fn record_trigger(&mut self, element: NodeId) {
        self.last_triggered = Some(element);
    }

    /// Forget `element` if it was the last trigger.
    pub fn forget_trigger(&mut self, element: NodeId) {
        if self.last_triggered == Some(element) {
            self.last_triggered = None;
        }
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    /// Remember a newly scheduled timer, returning the one it supersedes.
    pub fn replace_pending(&mut self, timer: TimerId) -> Option<TimerId> {
        self.pending.replace(timer)
    }

    pub fn take_pending(&mut self) -> Option<TimerId> {
        self.pending.take()
    }
}

/// True when the focused element lies outside `container`'s subtree.
pub fn focus_escaped(doc: &Document, container: NodeId) -> bool {
    !doc.contains(container, doc.active_element())
}
