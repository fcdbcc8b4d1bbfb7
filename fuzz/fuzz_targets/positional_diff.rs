#![no_main]

use host::Document;
use libfuzzer_sys::fuzz_target;
use reconciler::{Element, create_root, h};
use scheduler::{Scheduler, StepDeadline};

const TAGS: [&str; 4] = ["p", "span", "em", "li"];
const MAX_RENDERS: usize = 16;

// Each input byte describes one child: the low bits pick a tag (or text),
// the next bit adds a nested child, and a 0xff byte ends the current render.
fn build(chunk: &[u8]) -> Element {
    h("div")
        .children(chunk.iter().map(|&byte| {
            let kind = usize::from(byte & 0x07);
            match TAGS.get(kind) {
                Some(tag) => {
                    let mut builder = h(tag).attr("className", u32::from(byte >> 4).to_string());
                    if byte & 0x08 != 0 {
                        builder = builder.child(h("b").child(i32::from(byte)));
                    }
                    builder.build()
                }
                None => reconciler::text(byte),
            }
        }))
        .build()
}

fuzz_target!(|data: &[u8]| {
    let scheduler = Scheduler::new();
    let mut doc = Document::new();
    let Ok(container) = doc.create_element("div") else {
        return;
    };
    let root = create_root(doc, container, &scheduler);

    for chunk in data.split(|&b| b == 0xff).take(MAX_RENDERS) {
        root.render(build(chunk));
        let steps = chunk.first().map_or(0, |b| usize::from(b % 4));
        if scheduler
            .run_until_idle_with(|| StepDeadline::new(steps))
            .is_err()
        {
            panic!("scheduler stalled");
        }
        if let Some(err) = root.take_error() {
            panic!("render failed: {err}");
        }
        let attached = root.host().attached_count(container);
        let owned = root
            .current_tree()
            .iter()
            .filter(|f| f.depth > 0 && f.host.is_some())
            .count();
        assert_eq!(attached, owned);
        // Removed and discarded nodes are released; only the container is extra.
        assert_eq!(root.host().node_count(), attached + 1);
        assert_eq!(root.fiber_count(), root.current_tree().len());
    }
});
