#![forbid(unsafe_code)]

//! The modal instance: open/closed state machine plus trigger management.
//!
//! A [`Modal`] wraps one page element (see [`ModalFrame`]), binds click
//! listeners to its triggers and reacts to backdrop clicks and Escape.
//! Handles are cheap to clone; clones share state.
//!
//! # Invariants
//!
//! - `is_open()` reflects the last transition; the open class on the wrapper
//!   and body is only ever written by a transition.
//! - A trigger element is bound at most once, so one click toggles once.
//! - While disabled, no trigger has a click listener attached.
//! - A deferred focus scheduled under an older generation never applies.
//! - Listener closures hold weak references. Dropping every handle without
//!   `dispose()` still detaches the listeners and cancels the deferred focus,
//!   but leaves the generated markup in place.
//! - Closing a modal that is not open leaves the body class and scroll lock
//!   untouched.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Element without `id` | [`ModalError::InvalidModalTarget`] |
//! | Removing an untracked trigger | No-op |
//! | Any operation after `dispose()` | No-op |
//!
//! # Example
//!
//! ```
//! use modality_core::{Document, Event};
//! use modality_widgets::modal::{Modal, ModalOptions};
//!
//! let doc = Document::new();
//! let dialog = doc.build("div").id("m1").append_to(doc.body());
//! let link = doc.build("a").attr("href", "#m1").append_to(doc.body());
//!
//! let modal = Modal::new(&doc, dialog, &ModalOptions::new()).unwrap();
//! assert!(!modal.is_open());
//!
//! doc.dispatch(Event::click(link));
//! assert!(modal.is_open());
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use modality_core::{Document, EventKind, Key, ListenerId, NodeId};

use super::container::{ModalFrame, ModalHit, trigger_selector};
use super::focus::{FocusTracker, focus_escaped};
use super::settings::{ModalOptions, ModalSettings};
use super::triggers::TriggerSet;
use crate::error::ModalError;

#[derive(Debug)]
struct ModalState {
    open: bool,
    enabled: bool,
    disposed: bool,
    triggers: TriggerSet,
    focus: FocusTracker,
    page_listeners: Vec<ListenerId>,
}

struct ModalShared {
    id: String,
    doc: Document,
    frame: ModalFrame,
    settings: ModalSettings,
    state: RefCell<ModalState>,
}

impl Drop for ModalShared {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.disposed {
            return;
        }
        let mut listeners = state.triggers.drain();
        listeners.append(&mut state.page_listeners);
        for listener in listeners {
            self.doc.remove_event_listener(listener);
        }
        if let Some(timer) = state.focus.take_pending() {
            self.doc.clear_timeout(timer);
        }
    }
}

/// Handle to a modal dialog.
#[derive(Clone)]
pub struct Modal {
    shared: Rc<ModalShared>,
}

impl fmt::Debug for Modal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("Modal")
            .field("id", &self.shared.id)
            .field("frame", &self.shared.frame)
            .field("open", &state.open)
            .field("enabled", &state.enabled)
            .field("disposed", &state.disposed)
            .field("triggers", &state.triggers.elements())
            .finish()
    }
}

impl Modal {
    /// Turn `element` into a modal.
    ///
    /// Settings resolve as `options` over the element's `data-*` attributes
    /// over the defaults. The element is wrapped in place, its conventional
    /// triggers are bound when `auto_bind` is set, and it opens right away
    /// when `open_on_load` is set.
    pub fn new(doc: &Document, element: NodeId, options: &ModalOptions) -> Result<Self, ModalError> {
        let id = doc
            .id(element)
            .filter(|id| !id.is_empty())
            .ok_or(ModalError::InvalidModalTarget { node: element })?;

        let settings = ModalSettings::resolve(options, &doc.dataset(element));
        let frame = ModalFrame::build(doc, element, &settings);

        let modal = Self {
            shared: Rc::new(ModalShared {
                id,
                doc: doc.clone(),
                frame,
                state: RefCell::new(ModalState {
                    open: false,
                    enabled: settings.enabled,
                    disposed: false,
                    triggers: TriggerSet::new(),
                    focus: FocusTracker::new(),
                    page_listeners: Vec::new(),
                }),
                settings,
            }),
        };

        if modal.shared.settings.auto_bind {
            for trigger in doc.select(&trigger_selector(&modal.shared.id)) {
                modal.add_trigger(trigger);
            }
        }

        let listeners = modal.attach_page_listeners();
        modal.shared.state.borrow_mut().page_listeners = listeners;

        tracing::debug!(
            id = %modal.shared.id,
            triggers = modal.shared.state.borrow().triggers.len(),
            settings = ?modal.shared.settings,
            "modal created"
        );

        if modal.shared.settings.open_on_load {
            modal.open();
        }
        Ok(modal)
    }

    /// [`Modal::new`], then run `f` with the finished modal.
    pub fn with_callback(
        doc: &Document,
        element: NodeId,
        options: &ModalOptions,
        f: impl FnOnce(&Modal),
    ) -> Result<Self, ModalError> {
        let modal = Self::new(doc, element, options)?;
        f(&modal);
        Ok(modal)
    }

    fn from_weak(weak: &Weak<ModalShared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    /// True when both handles refer to the same modal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    // --- Accessors ---

    /// Id of the wrapped element.
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn document(&self) -> &Document {
        &self.shared.doc
    }

    /// The original content element.
    pub fn element(&self) -> NodeId {
        self.shared.frame.element
    }

    /// The generated outer container.
    pub fn wrapper(&self) -> NodeId {
        self.shared.frame.wrapper
    }

    /// The generated content slot.
    pub fn inner(&self) -> NodeId {
        self.shared.frame.inner
    }

    pub fn frame(&self) -> ModalFrame {
        self.shared.frame
    }

    pub fn settings(&self) -> &ModalSettings {
        &self.shared.settings
    }

    pub fn is_open(&self) -> bool {
        self.shared.state.borrow().open
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.state.borrow().enabled
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.state.borrow().disposed
    }

    /// Tracked trigger elements, in the order they were added.
    pub fn triggers(&self) -> Vec<NodeId> {
        self.shared.state.borrow().triggers.elements()
    }

    /// True when `element` is tracked and currently has its click listener.
    pub fn is_trigger_bound(&self, element: NodeId) -> bool {
        self.shared.state.borrow().triggers.is_bound(element)
    }

    /// The trigger that fired most recently.
    pub fn last_triggered(&self) -> Option<NodeId> {
        self.shared.state.borrow().focus.last_triggered()
    }

    /// Transition counter guarding the deferred focus.
    pub fn generation(&self) -> u64 {
        self.shared.state.borrow().focus.generation()
    }

    // --- Transitions ---

    pub fn open(&self) -> &Self {
        self.transition(true, || {})
    }

    /// Open, then run `f` after `on_open`.
    pub fn open_with(&self, f: impl FnOnce()) -> &Self {
        self.transition(true, f)
    }

    pub fn close(&self) -> &Self {
        self.transition(false, || {})
    }

    /// Close, then run `f` after `on_close`.
    pub fn close_with(&self, f: impl FnOnce()) -> &Self {
        self.transition(false, f)
    }

    pub fn toggle(&self) -> &Self {
        self.toggle_with(|| {})
    }

    /// Close if open, otherwise open; `f` runs after the transition.
    pub fn toggle_with(&self, f: impl FnOnce()) -> &Self {
        let open = !self.is_open();
        self.transition(open, f)
    }

    fn transition(&self, open: bool, callback: impl FnOnce()) -> &Self {
        let shared = &self.shared;
        let doc = &shared.doc;
        let settings = &shared.settings;

        let (was_open, generation, stale, restore_to) = {
            let mut state = shared.state.borrow_mut();
            if state.disposed {
                return self;
            }
            let was_open = std::mem::replace(&mut state.open, open);
            let generation = state.focus.bump();
            (
                was_open,
                generation,
                state.focus.take_pending(),
                state.focus.last_triggered(),
            )
        };
        if let Some(timer) = stale {
            doc.clear_timeout(timer);
        }

        shared.frame.set_visible(doc, &settings.open_class, open);
        // Closing an already closed modal leaves the body to whichever
        // modal set it.
        let body = doc.body();
        if open {
            doc.add_class(body, &settings.open_class);
            if settings.lock_scroll {
                doc.set_style(body, "overflow", "hidden");
            }
        } else if was_open {
            doc.remove_class(body, &settings.open_class);
            if settings.lock_scroll {
                doc.remove_style(body, "overflow");
            }
        }

        if settings.accessible {
            let element = shared.frame.element;
            if open {
                doc.set_attribute(element, "tabindex", "0");
                self.schedule_focus(generation);
            } else {
                doc.set_attribute(element, "tabindex", "-1");
                if let Some(trigger) = restore_to {
                    doc.focus(trigger);
                }
            }
        }

        tracing::debug!(id = %shared.id, open, generation, "modal transition");

        let hook = if open {
            settings.on_open.clone()
        } else {
            settings.on_close.clone()
        };
        if let Some(hook) = hook {
            hook();
        }
        callback();
        self
    }

    fn schedule_focus(&self, generation: u64) {
        let weak = Rc::downgrade(&self.shared);
        let timer = self
            .shared
            .doc
            .set_timeout(self.shared.settings.focus_delay, move || {
                let Some(modal) = Self::from_weak(&weak) else {
                    return;
                };
                let current = {
                    let mut state = modal.shared.state.borrow_mut();
                    let current = !state.disposed && state.focus.is_current(generation);
                    if current {
                        state.focus.take_pending();
                    }
                    current
                };
                if current {
                    modal.shared.doc.focus(modal.shared.frame.element);
                    tracing::trace!(id = %modal.shared.id, generation, "deferred focus applied");
                }
            });
        let superseded = self.shared.state.borrow_mut().focus.replace_pending(timer);
        if let Some(old) = superseded {
            self.shared.doc.clear_timeout(old);
        }
    }

    // --- Triggers ---

    fn bind_trigger(&self, element: NodeId) -> ListenerId {
        let weak = Rc::downgrade(&self.shared);
        self.shared
            .doc
            .add_event_listener(element, EventKind::Click, move |ctx| {
                if let Some(modal) = Self::from_weak(&weak) {
                    ctx.prevent_default();
                    modal.toggle();
                    modal.shared.state.borrow_mut().focus.record_trigger(element);
                }
            })
    }

    /// Track `element` as a trigger. Adding an already tracked element
    /// replaces its binding instead of adding a second one.
    pub fn add_trigger(&self, element: NodeId) -> &Self {
        let enabled = {
            let state = self.shared.state.borrow();
            if state.disposed {
                return self;
            }
            state.enabled
        };
        let listener = enabled.then(|| self.bind_trigger(element));
        let previous = self
            .shared
            .state
            .borrow_mut()
            .triggers
            .upsert(element, listener);
        if let Some(old) = previous {
            self.shared.doc.remove_event_listener(old);
        }
        tracing::trace!(id = %self.shared.id, trigger = element.index(), bound = enabled, "trigger added");
        self
    }

    /// Stop tracking `element`; untracked elements are ignored.
    pub fn remove_trigger(&self, element: NodeId) -> &Self {
        let removed = {
            let mut state = self.shared.state.borrow_mut();
            let removed = state.triggers.remove(element);
            if removed.is_some() {
                state.focus.forget_trigger(element);
            }
            removed
        };
        if let Some(binding) = removed {
            if let Some(listener) = binding.listener {
                self.shared.doc.remove_event_listener(listener);
            }
            tracing::trace!(id = %self.shared.id, trigger = element.index(), "trigger removed");
        }
        self
    }

    /// Re-attach the click listener of every tracked trigger.
    pub fn enable(&self) -> &Self {
        let elements = {
            let mut state = self.shared.state.borrow_mut();
            if state.disposed || state.enabled {
                return self;
            }
            state.enabled = true;
            state.triggers.elements()
        };
        for element in elements {
            let listener = self.bind_trigger(element);
            self.shared
                .state
                .borrow_mut()
                .triggers
                .set_listener(element, listener);
        }
        tracing::debug!(id = %self.shared.id, "modal enabled");
        self
    }

    /// Detach every trigger listener; triggers stay tracked.
    pub fn disable(&self) -> &Self {
        let listeners = {
            let mut state = self.shared.state.borrow_mut();
            if state.disposed || !state.enabled {
                return self;
            }
            state.enabled = false;
            state.triggers.take_listeners()
        };
        for listener in listeners {
            self.shared.doc.remove_event_listener(listener);
        }
        tracing::debug!(id = %self.shared.id, "modal disabled");
        self
    }

    // --- Page listeners ---

    fn attach_page_listeners(&self) -> Vec<ListenerId> {
        let doc = &self.shared.doc;
        let settings = &self.shared.settings;
        let mut listeners = Vec::new();

        if settings.click_off_to_close {
            let weak = Rc::downgrade(&self.shared);
            listeners.push(doc.add_event_listener(
                self.shared.frame.wrapper,
                EventKind::Click,
                move |ctx| {
                    let Some(modal) = Self::from_weak(&weak) else {
                        return;
                    };
                    let hit = modal.shared.frame.hit_test(&modal.shared.doc, ctx.target());
                    if hit == ModalHit::Backdrop && modal.is_open() {
                        tracing::trace!(id = %modal.shared.id, "backdrop click");
                        modal.close();
                    }
                },
            ));
        }

        if settings.accessible {
            let weak = Rc::downgrade(&self.shared);
            listeners.push(doc.add_event_listener(doc.body(), EventKind::KeyUp, move |ctx| {
                let Some(modal) = Self::from_weak(&weak) else {
                    return;
                };
                if !matches!(ctx.key(), Some(Key::Tab | Key::Escape)) || !modal.is_open() {
                    return;
                }
                let element = modal.shared.frame.element;
                if focus_escaped(&modal.shared.doc, element) {
                    ctx.stop_propagation();
                    modal.shared.doc.focus(element);
                    tracing::trace!(id = %modal.shared.id, "focus returned to modal");
                }
            }));
        }

        if settings.close_on_escape {
            let weak = Rc::downgrade(&self.shared);
            listeners.push(doc.add_event_listener(doc.body(), EventKind::KeyUp, move |ctx| {
                if ctx.key() != Some(&Key::Escape) {
                    return;
                }
                if let Some(modal) = Self::from_weak(&weak)
                    && modal.is_open()
                {
                    modal.close();
                }
            }));
        }

        listeners
    }

    // --- Teardown ---

    /// Close the modal if open, detach every listener it attached, cancel
    /// a pending deferred focus and put the element back where it was.
    pub fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        if self.is_open() {
            self.close();
        }
        let (listeners, pending) = {
            let mut state = self.shared.state.borrow_mut();
            state.disposed = true;
            let mut listeners = state.triggers.drain();
            listeners.append(&mut state.page_listeners);
            (listeners, state.focus.take_pending())
        };
        let doc = &self.shared.doc;
        for listener in listeners {
            doc.remove_event_listener(listener);
        }
        if let Some(timer) = pending {
            doc.clear_timeout(timer);
        }
        self.shared.frame.unwrap(doc);
        tracing::debug!(id = %self.shared.id, "modal disposed");
    }
}
