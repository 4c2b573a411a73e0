#![forbid(unsafe_code)]

//! Modal dialogs over a [`Document`](modality_core::Document): settings,
//! wrapper markup, the instance state machine, triggers and the registry.
//!
//! # Settings precedence
//!
//! Explicit [`ModalOptions`] win over the element's `data-*` attributes,
//! which win over [`ModalSettings::default`]. Settings are resolved once at
//! construction.
//!
//! # Focus management
//!
//! With `accessible` set (the default), opening a modal focuses its element
//! after `focus_delay`, Tab/Escape keyups that find focus outside the modal
//! pull it back, and closing returns focus to the trigger that last fired.
//!
//! # Example
//!
//! ```
//! use modality_core::{Document, Event, Key};
//! use modality_widgets::modal::{ModalOptions, ModalRegistry};
//!
//! let doc = Document::new();
//! doc.build("div").id("m1").append_to(doc.body());
//!
//! let mut modals = ModalRegistry::new(&doc);
//! let created = modals.init("#m1", &ModalOptions::new()).unwrap();
//! let modal = &created[0];
//!
//! modal.open();
//! doc.dispatch(Event::key_up(doc.body(), Key::Escape));
//! assert!(!modal.is_open());
//! ```

mod container;
mod focus;
mod instance;
mod registry;
mod settings;
mod triggers;

pub use container::{ModalFrame, ModalHit, trigger_selector};
pub use focus::{FocusTracker, focus_escaped};
pub use instance::Modal;
pub use registry::{AUTO_INIT_VALUE, ModalRegistry};
pub use settings::{
    Callback, DEFAULT_FOCUS_DELAY, ModalOptions, ModalSettings, SettingKey, parse_bool,
};
pub use triggers::{TriggerBinding, TriggerSet};
