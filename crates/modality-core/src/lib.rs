#![forbid(unsafe_code)]

//! Host-driven document model for Modality.
//!
//! The widget crates never touch a real browser. They talk to a
//! [`Document`]: an element tree with attributes, classes, inline style,
//! focus, bubbling events and a virtual-time timer queue. Hosts build the
//! page, feed input through [`Document::dispatch`] and advance time with
//! [`Document::advance`]; everything runs synchronously on one thread.

pub mod document;
pub mod event;
pub mod selector;
pub mod timer;

pub use document::{Document, ElementBuilder, Handler, NodeId};
pub use event::{DispatchOutcome, Event, EventContext, EventKind, Key, ListenerId, Modifiers};
pub use selector::{CompoundSelector, SelectorError, SelectorList, SelectorTarget};
pub use timer::{TimerId, TimerQueue};
