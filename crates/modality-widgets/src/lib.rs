#![forbid(unsafe_code)]

//! Modal dialog widget for Modality.
//!
//! Turns page elements into modals: wraps them in container markup, binds
//! their triggers, and handles backdrop clicks, Escape and focus. See
//! [`modal`] for the building blocks.

pub mod error;
pub mod modal;

pub use error::ModalError;
pub use modal::{Modal, ModalOptions, ModalRegistry, ModalSettings};
