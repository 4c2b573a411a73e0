#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use modality_core::{Document, Event, Key};
use modality_widgets::modal::{Modal, ModalOptions};

#[derive(Debug, Arbitrary)]
enum Step {
    Open,
    Close,
    Toggle,
    Enable,
    Disable,
    AddTrigger(u8),
    RemoveTrigger(u8),
    Click(u8),
    KeyUp(u8, bool),
    Advance(u8),
    Dispose,
}

fuzz_target!(|steps: Vec<Step>| {
    let doc = Document::new();
    let dialog = doc.build("div").id("m").append_to(doc.body());
    let mut nodes = vec![doc.body(), dialog];
    for _ in 0..4 {
        nodes.push(doc.build("button").append_to(doc.body()));
    }
    nodes.push(doc.build("a").attr("href", "#m").append_to(doc.body()));
    nodes.push(doc.build("input").append_to(dialog));

    let Ok(modal) = Modal::new(&doc, dialog, &ModalOptions::new()) else {
        return;
    };
    nodes.push(modal.wrapper());
    nodes.push(modal.inner());
    let pick = |i: u8| nodes[usize::from(i) % nodes.len()];

    for step in steps.iter().take(256) {
        match *step {
            Step::Open => {
                modal.open();
            }
            Step::Close => {
                modal.close();
            }
            Step::Toggle => {
                modal.toggle();
            }
            Step::Enable => {
                modal.enable();
            }
            Step::Disable => {
                modal.disable();
            }
            Step::AddTrigger(i) => {
                modal.add_trigger(pick(i));
            }
            Step::RemoveTrigger(i) => {
                modal.remove_trigger(pick(i));
            }
            Step::Click(i) => {
                doc.dispatch(Event::click(pick(i)));
            }
            Step::KeyUp(i, escape) => {
                let key = if escape { Key::Escape } else { Key::Tab };
                doc.dispatch(Event::key_up(pick(i), key));
            }
            Step::Advance(ms) => {
                doc.advance(Duration::from_millis(u64::from(ms)));
            }
            Step::Dispose => modal.dispose(),
        }

        let open_class = doc.has_class(modal.wrapper(), "mm-show");
        assert!(modal.is_disposed() || open_class == modal.is_open());
        let mut seen = modal.triggers();
        let tracked = seen.len();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), tracked);
        assert!(doc.pending_timers() <= 1);
    }
});
