#![forbid(unsafe_code)]

//! Wrapper markup around a modal's content element.
//!
//! A frame is two generated containers:
//!
//! ```text
//! <div class="{modal_class} {effect} {user_class}" aria-hidden="true">
//!   <div class="{inner_class}">ELEMENT</div>
//! </div>
//! ```
//!
//! The wrapper takes the element's former place in the page. Clicks are
//! classified with [`ModalFrame::hit_test`]: only a click whose target is the
//! wrapper itself lands on the backdrop; anything inside the inner container
//! (its padding included) is content.

use modality_core::{CompoundSelector, Document, NodeId, SelectorList};

use super::settings::ModalSettings;

/// Where a click landed relative to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalHit {
    /// Exactly on the wrapper, outside the content slot.
    Backdrop,
    /// On the inner container or anything it contains.
    Content,
    /// Not inside the frame at all.
    Outside,
}

/// Generated containers around one content element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalFrame {
    pub wrapper: NodeId,
    pub inner: NodeId,
    pub element: NodeId,
}

impl ModalFrame {
    /// Wrap `element`, putting the wrapper where the element was.
    ///
    /// A detached element gets its wrapper appended to `<body>`. Any inline
    /// `display: none` on the element is cleared.
    pub fn build(doc: &Document, element: NodeId, settings: &ModalSettings) -> Self {
        let wrapper = doc
            .build("div")
            .class(&settings.wrapper_class())
            .attr("aria-hidden", "true")
            .finish();
        let inner = doc.build("div").class(&settings.inner_class).finish();

        if !doc.replace_with(element, wrapper) {
            doc.append_child(doc.body(), wrapper);
        }
        doc.append_child(wrapper, inner);
        doc.append_child(inner, element);

        if doc
            .style(element, "display")
            .is_some_and(|d| d.trim().eq_ignore_ascii_case("none"))
        {
            doc.remove_style(element, "display");
        }

        Self {
            wrapper,
            inner,
            element,
        }
    }

    /// Classify a click target.
    pub fn hit_test(&self, doc: &Document, target: NodeId) -> ModalHit {
        if target == self.wrapper {
            ModalHit::Backdrop
        } else if doc.contains(self.wrapper, target) {
            ModalHit::Content
        } else {
            ModalHit::Outside
        }
    }

    /// Apply the visual open/closed state to the wrapper.
    pub fn set_visible(&self, doc: &Document, open_class: &str, visible: bool) {
        if visible {
            doc.add_class(self.wrapper, open_class);
            doc.set_attribute(self.wrapper, "aria-hidden", "false");
        } else {
            doc.remove_class(self.wrapper, open_class);
            doc.set_attribute(self.wrapper, "aria-hidden", "true");
        }
    }

    /// Put the element back where the wrapper sits and drop the wrapper.
    pub fn unwrap(&self, doc: &Document) {
        if !doc.replace_with(self.wrapper, self.element) {
            doc.remove_child(self.inner, self.element);
        }
    }
}

/// Selector for the elements that trigger modal `id` by convention:
/// `a[href="#id"], [data-modality="#id"]`.
pub fn trigger_selector(id: &str) -> SelectorList {
    let target = format!("#{id}");
    SelectorList::single(
        CompoundSelector::new()
            .tag("a")
            .attribute_equals("href", target.clone()),
    )
    .or(CompoundSelector::new().attribute_equals("data-modality", target))
}
