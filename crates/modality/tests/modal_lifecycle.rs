#![forbid(unsafe_code)]

//! End-to-end modal scenarios driven through the public facade.
//!
//! Pages are built with the document model, modals are created through the
//! registry, and every interaction goes through `Document::dispatch` the way
//! a host embedding would feed input.
//!
//! # Invariants
//!
//! 1. **Initial state**: `is_open()` right after init equals `open_on_load`.
//! 2. **Round trip**: open then close restores classes, aria and focus.
//! 3. **One entry per id**: repeated `init` never duplicates a modal.
//! 4. **Clean teardown**: `clear()` leaves no listener and no wrapper behind.
//!
//! Run: `cargo test -p modality --test modal_lifecycle`

use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use modality::prelude::*;
use pretty_assertions::assert_eq;
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

// =============================================================================
// Test Utilities
// =============================================================================

fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    (count, move || c.set(c.get() + 1))
}

struct Page {
    doc: Document,
    trigger: NodeId,
    dialog: NodeId,
    close_button: NodeId,
}

/// `<a href="#m1">` trigger, `<div id="m1">` dialog with a close button.
fn page() -> Page {
    let doc = Document::new();
    let trigger = doc.build("a").attr("href", "#m1").append_to(doc.body());
    let dialog = doc
        .build("div")
        .id("m1")
        .style("display", "none")
        .append_to(doc.body());
    doc.build("h2").append_to(dialog);
    let close_button = doc.build("button").class("close").append_to(dialog);
    Page {
        doc,
        trigger,
        dialog,
        close_button,
    }
}

#[derive(Debug, Clone)]
struct Captured {
    level: Level,
    message: String,
}

#[derive(Clone, Default)]
struct CaptureLayer {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        if let Ok(mut events) = self.events.lock() {
            events.push(Captured {
                level: *event.metadata().level(),
                message,
            });
        }
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
        }
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn init_open_toggle_scenario() {
    let p = page();
    let (opened, on_open) = counter();
    let (closed, on_close) = counter();
    let options = ModalOptions::new()
        .open_on_load(false)
        .on_open(on_open)
        .on_close(on_close);

    let mut registry = ModalRegistry::new(&p.doc);
    let created = registry.init("#m1", &options).unwrap();
    let [modal] = created.as_slice() else {
        panic!("expected exactly one modal, got {}", created.len());
    };
    assert!(!modal.is_open());

    modal.open();
    assert!(modal.is_open());
    assert_eq!(opened.get(), 1);

    modal.toggle();
    assert!(!modal.is_open());
    assert_eq!(closed.get(), 1);
}

#[test]
fn construction_wraps_and_reveals_element() {
    let p = page();
    let mut registry = ModalRegistry::new(&p.doc);
    let modal = registry.init("#m1", &ModalOptions::new()).unwrap().remove(0);

    assert_eq!(p.doc.style(p.dialog, "display"), None);
    assert_eq!(p.doc.parent(p.dialog), Some(modal.inner()));
    assert_eq!(p.doc.parent(modal.inner()), Some(modal.wrapper()));
    assert_eq!(
        p.doc.children(p.doc.body()),
        vec![p.trigger, modal.wrapper()]
    );
    assert_eq!(modal.triggers(), vec![p.trigger]);
}

#[test]
fn accessible_round_trip_through_trigger() {
    let p = page();
    let mut registry = ModalRegistry::new(&p.doc);
    let modal = registry.init("#m1", &ModalOptions::new()).unwrap().remove(0);

    let outcome = p.doc.dispatch(Event::click(p.trigger));
    assert!(outcome.default_prevented);
    assert_eq!(p.doc.location_hash(), None);
    assert!(modal.is_open());
    assert!(p.doc.has_class(p.doc.body(), "mm-show"));

    p.doc.advance(Duration::from_millis(50));
    assert_eq!(p.doc.active_element(), p.dialog);

    p.doc.dispatch(Event::key_up(p.dialog, Key::Escape));
    assert!(!modal.is_open());
    assert_eq!(p.doc.active_element(), p.trigger);
    assert!(!p.doc.has_class(modal.wrapper(), "mm-show"));
    assert_eq!(
        p.doc.attribute(modal.wrapper(), "aria-hidden").as_deref(),
        Some("true")
    );
    assert_eq!(p.doc.style(p.doc.body(), "overflow"), None);
}

#[test]
fn clicks_inside_content_keep_modal_open() {
    let p = page();
    let mut registry = ModalRegistry::new(&p.doc);
    let modal = registry.init("#m1", &ModalOptions::new()).unwrap().remove(0);
    modal.open();

    p.doc.dispatch(Event::click(p.close_button));
    p.doc.dispatch(Event::click(p.dialog));
    assert!(modal.is_open());

    p.doc.dispatch(Event::click(modal.wrapper()));
    assert!(!modal.is_open());
}

#[test]
fn host_wired_close_button() {
    let p = page();
    let mut registry = ModalRegistry::new(&p.doc);
    registry.init("#m1", &ModalOptions::new()).unwrap();

    let modal = registry.get("m1").cloned().unwrap();
    let handle = modal.clone();
    p.doc
        .add_event_listener(p.close_button, EventKind::Click, move |_| {
            handle.close();
        });

    modal.open();
    p.doc.dispatch(Event::click(p.close_button));
    assert!(!modal.is_open());
}

#[test]
fn data_attributes_configure_and_options_override() {
    let doc = Document::new();
    let dialog = doc
        .build("div")
        .id("m1")
        .attr("data-close-on-escape", "false")
        .attr("data-effect", "fade-in")
        .attr("data-user-class", "wide")
        .append_to(doc.body());

    let mut registry = ModalRegistry::new(&doc);
    let modal = registry
        .init("#m1", &ModalOptions::new().user_class("narrow"))
        .unwrap()
        .remove(0);

    assert_eq!(modal.settings().effect, "fade-in");
    assert_eq!(
        doc.class_name(modal.wrapper()),
        "modality-modal fade-in narrow"
    );

    modal.open();
    doc.dispatch(Event::key_up(dialog, Key::Escape));
    assert!(modal.is_open());
}

#[test]
fn two_modals_share_a_page() {
    let doc = Document::new();
    let a_link = doc.build("a").attr("href", "#a").append_to(doc.body());
    let b_link = doc
        .build("button")
        .attr("data-modality", "#b")
        .append_to(doc.body());
    doc.build("section").id("a").class("modal").append_to(doc.body());
    doc.build("section").id("b").class("modal").append_to(doc.body());

    let mut registry = ModalRegistry::new(&doc);
    registry.init("section.modal", &ModalOptions::new()).unwrap();
    let a = registry.get("a").cloned().unwrap();
    let b = registry.get("b").cloned().unwrap();

    doc.dispatch(Event::click(a_link));
    assert!(a.is_open() && !b.is_open());
    doc.dispatch(Event::click(b_link));
    assert!(a.is_open() && b.is_open());

    doc.dispatch(Event::click(a.wrapper()));
    assert!(!a.is_open() && b.is_open());
}

#[test]
fn disable_makes_triggers_inert() {
    let p = page();
    let mut registry = ModalRegistry::new(&p.doc);
    let modal = registry.init("#m1", &ModalOptions::new()).unwrap().remove(0);

    modal.disable();
    p.doc.dispatch(Event::click(p.trigger));
    assert!(!modal.is_open());
    assert_eq!(p.doc.location_hash().as_deref(), Some("#m1"));

    modal.enable();
    p.doc.dispatch(Event::click(p.trigger));
    assert!(modal.is_open());
}

#[test]
fn auto_init_then_clear() {
    let doc = Document::new();
    let link = doc.build("a").attr("href", "#promo").append_to(doc.body());
    let promo = doc
        .build("div")
        .id("promo")
        .attr("data-modality", "auto")
        .attr("data-open-on-load", "true")
        .append_to(doc.body());
    let baseline = doc.total_listeners();

    let mut registry = ModalRegistry::new(&doc);
    let created = registry.auto_init();
    assert_eq!(created.len(), 1);
    assert!(created[0].is_open());

    registry.clear();
    assert!(registry.is_empty());
    assert_eq!(doc.total_listeners(), baseline);
    assert_eq!(doc.children(doc.body()), vec![link, promo]);
    assert!(!doc.has_class(doc.body(), "mm-show"));
    assert_eq!(doc.pending_timers(), 0);
}

#[test]
fn dropped_registry_lets_links_navigate() {
    let p = page();
    let baseline = p.doc.total_listeners();
    let mut registry = ModalRegistry::new(&p.doc);
    registry.init("#m1", &ModalOptions::new()).unwrap();
    assert!(p.doc.total_listeners() > baseline);

    drop(registry);
    assert_eq!(p.doc.total_listeners(), baseline);

    let outcome = p.doc.dispatch(Event::click(p.trigger));
    assert!(!outcome.default_prevented);
    assert_eq!(p.doc.navigations(), vec!["#m1".to_owned()]);
}

#[test]
fn invalid_targets_are_reported() {
    let doc = Document::new();
    doc.build("div").class("modal").append_to(doc.body());
    let mut registry = ModalRegistry::new(&doc);

    let err = registry.init(".modal", &ModalOptions::new()).unwrap_err();
    assert!(matches!(err, ModalError::InvalidModalTarget { .. }));
    let err = registry.init("[data-modality", &ModalOptions::new()).unwrap_err();
    assert!(matches!(err, ModalError::Selector(_)));
    assert!(registry.init("#nothing", &ModalOptions::new()).unwrap().is_empty());
}

#[test]
fn transitions_are_logged() {
    let layer = CaptureLayer::default();
    let events = Arc::clone(&layer.events);
    let subscriber = tracing_subscriber::registry().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        let p = page();
        let mut registry = ModalRegistry::new(&p.doc);
        let modal = registry.init("#m1", &ModalOptions::new()).unwrap().remove(0);
        modal.open().close();
        registry.init("#m1", &ModalOptions::new()).unwrap();
        registry.clear();
    });

    let events = events.lock().unwrap();
    let count = |msg: &str| events.iter().filter(|e| e.message == msg).count();
    assert_eq!(count("modal created"), 1);
    assert_eq!(count("modal transition"), 2);
    assert_eq!(count("modal disposed"), 1);
    assert!(
        events
            .iter()
            .any(|e| e.level == Level::WARN && e.message.contains("already registered"))
    );
}
