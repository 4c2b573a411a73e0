#![forbid(unsafe_code)]

//! Input events routed through a [`Document`](crate::Document).
//!
//! Events are plain values built by the host (`Event::click(node)`,
//! `Event::key_up(node, Key::Escape)`) and dispatched with
//! [`Document::dispatch`](crate::Document::dispatch). Listeners receive an
//! [`EventContext`] that exposes the event plus the DOM-style controls:
//! `prevent_default`, `stop_propagation` and `stop_immediate_propagation`.
//!
//! # Invariants
//!
//! - A [`ListenerId`] is unique for the lifetime of its document and is the
//!   only handle that can detach the listener (exact-pair removal).
//! - `current_target` always lies on the path from `target` to the root.

use bitflags::bitflags;

use crate::document::NodeId;

/// Kinds of events the document can route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Primary pointer activation.
    Click,
    /// Key pressed.
    KeyDown,
    /// Key released.
    KeyUp,
}

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// Logical key carried by keyboard events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Tab,
    Enter,
    Char(char),
    /// Any other named key (`"ArrowUp"`, `"F1"`, ...).
    Other(String),
}

impl Key {
    /// Map a legacy numeric key code to a [`Key`].
    ///
    /// Only the codes the widget layer cares about get dedicated variants;
    /// printable ASCII maps to [`Key::Char`] and the rest to [`Key::Other`].
    pub fn from_key_code(code: u32) -> Self {
        match code {
            27 => Self::Escape,
            9 => Self::Tab,
            13 => Self::Enter,
            32..=126 => char::from_u32(code)
                .map(Self::Char)
                .unwrap_or_else(|| Self::Other(code.to_string())),
            _ => Self::Other(code.to_string()),
        }
    }

    /// Map a `KeyboardEvent.key` style name to a [`Key`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Self::Escape,
            "Tab" => Self::Tab,
            "Enter" => Self::Enter,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Other(name.to_owned()),
                }
            }
        }
    }
}

/// An event ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// Innermost node the event was fired at.
    pub target: NodeId,
    /// Present for keyboard events.
    pub key: Option<Key>,
    pub modifiers: Modifiers,
}

impl Event {
    /// A click on `target`.
    pub fn click(target: NodeId) -> Self {
        Self {
            kind: EventKind::Click,
            target,
            key: None,
            modifiers: Modifiers::empty(),
        }
    }

    /// A key release with `target` as the focused node.
    pub fn key_up(target: NodeId, key: Key) -> Self {
        Self {
            kind: EventKind::KeyUp,
            target,
            key: Some(key),
            modifiers: Modifiers::empty(),
        }
    }

    /// A key press with `target` as the focused node.
    pub fn key_down(target: NodeId, key: Key) -> Self {
        Self {
            kind: EventKind::KeyDown,
            target,
            key: Some(key),
            modifiers: Modifiers::empty(),
        }
    }

    /// Attach modifier keys.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Handle returned by `add_event_listener`, used to detach the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Mutable view of an event while it travels through listeners.
#[derive(Debug)]
pub struct EventContext<'a> {
    event: &'a Event,
    current_target: NodeId,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_stopped: bool,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(event: &'a Event) -> Self {
        Self {
            event,
            current_target: event.target,
            default_prevented: false,
            propagation_stopped: false,
            immediate_stopped: false,
        }
    }

    pub(crate) fn set_current_target(&mut self, node: NodeId) {
        self.current_target = node;
    }

    pub(crate) fn immediate_stopped(&self) -> bool {
        self.immediate_stopped
    }

    /// The event being dispatched.
    pub fn event(&self) -> &Event {
        self.event
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind
    }

    /// Node the event was fired at.
    pub fn target(&self) -> NodeId {
        self.event.target
    }

    /// Node whose listener is currently running.
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn key(&self) -> Option<&Key> {
        self.event.key.as_ref()
    }

    /// Suppress the document's default action (link navigation).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop bubbling after the listeners of the current node have run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop bubbling and skip the remaining listeners of the current node.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Summary of a finished dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    /// Number of listeners that ran.
    pub listeners_invoked: usize,
}
