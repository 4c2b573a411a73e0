#![forbid(unsafe_code)]

//! Modality: turn page elements into modal dialogs.
//!
//! This crate re-exports:
//! - [`modality_core`] as [`dom`]: the host-driven [`Document`] model
//! - [`modality_widgets`] as [`widgets`]: [`Modal`], [`ModalRegistry`] and settings
//!
//! # Example
//!
//! ```
//! use modality::prelude::*;
//!
//! let doc = Document::new();
//! let link = doc.build("a").attr("href", "#m1").append_to(doc.body());
//! doc.build("div").id("m1").append_to(doc.body());
//!
//! let mut modals = ModalRegistry::new(&doc);
//! modals.init("#m1", &ModalOptions::new()).unwrap();
//!
//! doc.dispatch(Event::click(link));
//! assert!(modals.get("m1").is_some_and(Modal::is_open));
//! ```

pub use modality_core as dom;
pub use modality_widgets as widgets;

pub use modality_core::{Document, Event, EventKind, Key, NodeId};
pub use modality_widgets::{Modal, ModalError, ModalOptions, ModalRegistry, ModalSettings};

/// Everything a page composer usually needs.
pub mod prelude {
    pub use modality_core::{Document, Event, EventKind, Key, Modifiers, NodeId};
    pub use modality_widgets::modal::{
        Modal, ModalHit, ModalOptions, ModalRegistry, ModalSettings, parse_bool,
    };
    pub use modality_widgets::ModalError;
}
